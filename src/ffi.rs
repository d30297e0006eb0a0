//! C-ABI surface and wire-format codecs for cross-language hosts (IPC
//! bridges, extension shells, anything that cannot link the Rust API
//! directly).
//!
//! Two layers:
//! - [`wire`]: pure encode/decode functions for the `Command`,
//!   `Response`, `AudioData`, and `MeterData` byte layouts. No I/O, no
//!   unsafe, independently testable.
//! - the `extern "C"` functions below: an opaque `*mut Processor` handle
//!   plus thin wrappers that call into [`wire`] and [`crate::processor`].
//!
//! All multi-byte fields are little-endian. Strings and byte payloads
//! are length-prefixed with a `u32` count followed by that many raw
//! bytes (UTF-8 for strings).

use std::ptr;

use crate::audio_block::AudioBlock;
use crate::config::{
    CompressionMode, EqPreset, NoiseReductionMode, ProcessorConfig, ProcessorState, ProcessorStatus,
};
use crate::error::EngineError;
use crate::processor::Processor;

/// Pure wire-format encode/decode, matching the fixed byte layouts of the
/// FFI surface. Kept free of `unsafe` and of the `Processor` type itself
/// so it can be exercised without an allocated handle.
pub mod wire {
    use super::EngineError;

    /// `CommandType` tags for [`Command::cmd_type`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(u8)]
    pub enum CommandType {
        SetBypass = 0,
        SetPreset = 1,
        SetNormalizerTarget = 2,
        SetCompressionMode = 3,
        SetNoiseMode = 4,
        SetEqBand = 5,
        StartNoiseLearn = 6,
        StopNoiseLearn = 7,
        Reset = 8,
        GetState = 9,
        GetLevels = 10,
    }

    impl CommandType {
        pub fn from_u8(v: u8) -> Option<Self> {
            match v {
                0 => Some(CommandType::SetBypass),
                1 => Some(CommandType::SetPreset),
                2 => Some(CommandType::SetNormalizerTarget),
                3 => Some(CommandType::SetCompressionMode),
                4 => Some(CommandType::SetNoiseMode),
                5 => Some(CommandType::SetEqBand),
                6 => Some(CommandType::StartNoiseLearn),
                7 => Some(CommandType::StopNoiseLearn),
                8 => Some(CommandType::Reset),
                9 => Some(CommandType::GetState),
                10 => Some(CommandType::GetLevels),
                _ => None,
            }
        }
    }

    /// `Command {cmd_type, param_int, param_float, param_string, param_bytes}`.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Command {
        pub cmd_type: u8,
        pub param_int: i32,
        pub param_float: f32,
        pub param_string: String,
        pub param_bytes: Vec<u8>,
    }

    fn push_u32_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
        out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(bytes);
    }

    fn take_u32_prefixed<'a>(buf: &'a [u8], cursor: &mut usize) -> Result<&'a [u8], EngineError> {
        if buf.len() < *cursor + 4 {
            return Err(EngineError::Decode("truncated length prefix"));
        }
        let len = u32::from_le_bytes(buf[*cursor..*cursor + 4].try_into().unwrap()) as usize;
        *cursor += 4;
        if buf.len() < *cursor + len {
            return Err(EngineError::Decode("truncated length-prefixed payload"));
        }
        let slice = &buf[*cursor..*cursor + len];
        *cursor += len;
        Ok(slice)
    }

    impl Command {
        pub fn encode(&self) -> Vec<u8> {
            let mut out = Vec::with_capacity(13 + self.param_string.len() + self.param_bytes.len());
            out.push(self.cmd_type);
            out.extend_from_slice(&self.param_int.to_le_bytes());
            out.extend_from_slice(&self.param_float.to_le_bytes());
            push_u32_prefixed(&mut out, self.param_string.as_bytes());
            push_u32_prefixed(&mut out, &self.param_bytes);
            out
        }

        pub fn decode(buf: &[u8]) -> Result<Self, EngineError> {
            if buf.len() < 9 {
                return Err(EngineError::Decode("command shorter than fixed header"));
            }
            let cmd_type = buf[0];
            let param_int = i32::from_le_bytes(buf[1..5].try_into().unwrap());
            let param_float = f32::from_le_bytes(buf[5..9].try_into().unwrap());

            let mut cursor = 9usize;
            let string_bytes = take_u32_prefixed(buf, &mut cursor)?;
            let param_string = String::from_utf8(string_bytes.to_vec())
                .map_err(|_| EngineError::Decode("param_string is not valid utf8"))?;
            let param_bytes = take_u32_prefixed(buf, &mut cursor)?.to_vec();

            Ok(Self {
                cmd_type,
                param_int,
                param_float,
                param_string,
                param_bytes,
            })
        }
    }

    /// `Response {success, error_message, state, data}`.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Response {
        pub success: bool,
        pub error_message: String,
        pub state: super::ProcessorState,
        pub data: Vec<u8>,
    }

    impl Response {
        pub fn ok(state: super::ProcessorState) -> Self {
            Self {
                success: true,
                error_message: String::new(),
                state,
                data: Vec::new(),
            }
        }

        pub fn err(state: super::ProcessorState, message: impl Into<String>) -> Self {
            Self {
                success: false,
                error_message: message.into(),
                state,
                data: Vec::new(),
            }
        }

        pub fn encode(&self) -> Vec<u8> {
            let mut out = Vec::with_capacity(32 + self.error_message.len() + self.data.len());
            out.push(self.success as u8);
            push_u32_prefixed(&mut out, self.error_message.as_bytes());
            encode_state(&self.state, &mut out);
            push_u32_prefixed(&mut out, &self.data);
            out
        }

        pub fn decode(buf: &[u8]) -> Result<Self, EngineError> {
            if buf.is_empty() {
                return Err(EngineError::Decode("response is empty"));
            }
            let success = buf[0] != 0;
            let mut cursor = 1usize;
            let message_bytes = take_u32_prefixed(buf, &mut cursor)?;
            let error_message = String::from_utf8(message_bytes.to_vec())
                .map_err(|_| EngineError::Decode("error_message is not valid utf8"))?;
            let state = decode_state(buf, &mut cursor)?;
            let data = take_u32_prefixed(buf, &mut cursor)?.to_vec();
            Ok(Self {
                success,
                error_message,
                state,
                data,
            })
        }
    }

    const STATE_WIRE_LEN: usize = 1 + 1 + 4 + 4 + 4 + 8;

    fn encode_state(state: &super::ProcessorState, out: &mut Vec<u8>) {
        out.push(state.state as u8);
        out.push(state.bypass as u8);
        out.extend_from_slice(&state.input_level_db.to_le_bytes());
        out.extend_from_slice(&state.output_level_db.to_le_bytes());
        out.extend_from_slice(&state.gain_reduction_db.to_le_bytes());
        out.extend_from_slice(&state.frames_processed.to_le_bytes());
    }

    fn decode_state(buf: &[u8], cursor: &mut usize) -> Result<super::ProcessorState, EngineError> {
        if buf.len() < *cursor + STATE_WIRE_LEN {
            return Err(EngineError::Decode("truncated state"));
        }
        let status_byte = buf[*cursor];
        let status = match status_byte {
            0 => super::ProcessorStatus::Idle,
            1 => super::ProcessorStatus::Active,
            2 => super::ProcessorStatus::Bypassed,
            3 => super::ProcessorStatus::Error,
            _ => return Err(EngineError::Decode("unknown processor status byte")),
        };
        let bypass = buf[*cursor + 1] != 0;
        let input_level_db = f32::from_le_bytes(buf[*cursor + 2..*cursor + 6].try_into().unwrap());
        let output_level_db = f32::from_le_bytes(buf[*cursor + 6..*cursor + 10].try_into().unwrap());
        let gain_reduction_db = f32::from_le_bytes(buf[*cursor + 10..*cursor + 14].try_into().unwrap());
        let frames_processed = u64::from_le_bytes(buf[*cursor + 14..*cursor + 22].try_into().unwrap());
        *cursor += STATE_WIRE_LEN;
        Ok(super::ProcessorState {
            state: status,
            bypass,
            input_level_db,
            output_level_db,
            gain_reduction_db,
            frames_processed,
        })
    }

    /// `AudioData {samples, sample_rate, channels, frame_count, timestamp_ms}`.
    #[derive(Debug, Clone, PartialEq)]
    pub struct AudioData {
        pub samples: Vec<f32>,
        pub sample_rate: u32,
        pub channels: u8,
        pub frame_count: u32,
        pub timestamp_ms: u64,
    }

    impl AudioData {
        pub fn encode(&self) -> Vec<u8> {
            let mut out = Vec::with_capacity(4 + self.samples.len() * 4 + 4 + 1 + 4 + 8);
            out.extend_from_slice(&(self.samples.len() as u32).to_le_bytes());
            for s in &self.samples {
                out.extend_from_slice(&s.to_le_bytes());
            }
            out.extend_from_slice(&self.sample_rate.to_le_bytes());
            out.push(self.channels);
            out.extend_from_slice(&self.frame_count.to_le_bytes());
            out.extend_from_slice(&self.timestamp_ms.to_le_bytes());
            out
        }

        pub fn decode(buf: &[u8]) -> Result<Self, EngineError> {
            if buf.len() < 4 {
                return Err(EngineError::Decode("audio data missing sample count"));
            }
            let sample_count = u32::from_le_bytes(buf[0..4].try_into().unwrap()) as usize;
            let samples_end = 4 + sample_count * 4;
            if buf.len() < samples_end + 4 + 1 + 4 + 8 {
                return Err(EngineError::Decode("audio data shorter than declared"));
            }
            let mut samples = Vec::with_capacity(sample_count);
            for i in 0..sample_count {
                let off = 4 + i * 4;
                samples.push(f32::from_le_bytes(buf[off..off + 4].try_into().unwrap()));
            }
            let mut cursor = samples_end;
            let sample_rate = u32::from_le_bytes(buf[cursor..cursor + 4].try_into().unwrap());
            cursor += 4;
            let channels = buf[cursor];
            cursor += 1;
            let frame_count = u32::from_le_bytes(buf[cursor..cursor + 4].try_into().unwrap());
            cursor += 4;
            let timestamp_ms = u64::from_le_bytes(buf[cursor..cursor + 8].try_into().unwrap());
            Ok(Self {
                samples,
                sample_rate,
                channels,
                frame_count,
                timestamp_ms,
            })
        }
    }

    /// `MeterData {input_peak_db, input_rms_db, output_peak_db, output_rms_db, gain_reduction, timestamp_ms}`.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct MeterData {
        pub input_peak_db: f32,
        pub input_rms_db: f32,
        pub output_peak_db: f32,
        pub output_rms_db: f32,
        pub gain_reduction: f32,
        pub timestamp_ms: u64,
    }

    impl MeterData {
        pub const WIRE_LEN: usize = 4 * 5 + 8;

        pub fn encode(&self) -> Vec<u8> {
            let mut out = Vec::with_capacity(Self::WIRE_LEN);
            out.extend_from_slice(&self.input_peak_db.to_le_bytes());
            out.extend_from_slice(&self.input_rms_db.to_le_bytes());
            out.extend_from_slice(&self.output_peak_db.to_le_bytes());
            out.extend_from_slice(&self.output_rms_db.to_le_bytes());
            out.extend_from_slice(&self.gain_reduction.to_le_bytes());
            out.extend_from_slice(&self.timestamp_ms.to_le_bytes());
            out
        }

        pub fn decode(buf: &[u8]) -> Result<Self, EngineError> {
            if buf.len() < Self::WIRE_LEN {
                return Err(EngineError::Decode("meter data shorter than fixed layout"));
            }
            Ok(Self {
                input_peak_db: f32::from_le_bytes(buf[0..4].try_into().unwrap()),
                input_rms_db: f32::from_le_bytes(buf[4..8].try_into().unwrap()),
                output_peak_db: f32::from_le_bytes(buf[8..12].try_into().unwrap()),
                output_rms_db: f32::from_le_bytes(buf[12..16].try_into().unwrap()),
                gain_reduction: f32::from_le_bytes(buf[16..20].try_into().unwrap()),
                timestamp_ms: u64::from_le_bytes(buf[20..28].try_into().unwrap()),
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn command_round_trips_through_wire() {
            let cmd = Command {
                cmd_type: CommandType::SetEqBand as u8,
                param_int: 3,
                param_float: -6.0,
                param_string: "hearing_aid".to_string(),
                param_bytes: vec![1, 2, 3],
            };
            let encoded = cmd.encode();
            let decoded = Command::decode(&encoded).unwrap();
            assert_eq!(cmd, decoded);
        }

        #[test]
        fn decode_rejects_truncated_command() {
            assert!(Command::decode(&[0u8; 4]).is_err());
        }

        #[test]
        fn command_type_round_trips_through_u8() {
            for t in [
                CommandType::SetBypass,
                CommandType::SetPreset,
                CommandType::SetNormalizerTarget,
                CommandType::SetCompressionMode,
                CommandType::SetNoiseMode,
                CommandType::SetEqBand,
                CommandType::StartNoiseLearn,
                CommandType::StopNoiseLearn,
                CommandType::Reset,
                CommandType::GetState,
                CommandType::GetLevels,
            ] {
                assert_eq!(CommandType::from_u8(t as u8), Some(t));
            }
            assert_eq!(CommandType::from_u8(255), None);
        }

        #[test]
        fn response_round_trips_through_wire() {
            let resp = Response {
                success: false,
                error_message: "processor not initialized".to_string(),
                state: super::super::ProcessorState::default(),
                data: vec![9, 9, 9],
            };
            let encoded = resp.encode();
            let decoded = Response::decode(&encoded).unwrap();
            assert_eq!(resp, decoded);
        }

        #[test]
        fn audio_data_round_trips_through_wire() {
            let data = AudioData {
                samples: vec![0.1, -0.2, 0.3, -0.4],
                sample_rate: 48_000,
                channels: 2,
                frame_count: 2,
                timestamp_ms: 123_456,
            };
            let encoded = data.encode();
            let decoded = AudioData::decode(&encoded).unwrap();
            assert_eq!(data, decoded);
        }

        #[test]
        fn meter_data_round_trips_through_wire() {
            let meters = MeterData {
                input_peak_db: -3.0,
                input_rms_db: -12.0,
                output_peak_db: -1.0,
                output_rms_db: -14.0,
                gain_reduction: 2.5,
                timestamp_ms: 42,
            };
            let encoded = meters.encode();
            let decoded = MeterData::decode(&encoded).unwrap();
            assert_eq!(meters, decoded);
        }
    }
}

/// Allocate a processor for `sample_rate`/`channels` and return an opaque
/// handle. Returns a null pointer if `channels` is `0`.
#[no_mangle]
pub extern "C" fn processor_new(sample_rate: f32, channels: u32) -> *mut Processor {
    if channels == 0 {
        return ptr::null_mut();
    }
    let config = ProcessorConfig::new(sample_rate, channels as usize);
    Box::into_raw(Box::new(Processor::new(config)))
}

/// Free a handle returned by [`processor_new`]. Passing a null pointer is
/// a no-op; passing the same non-null pointer twice is undefined
/// behavior, as with any C `free`-shaped API.
#[no_mangle]
pub extern "C" fn processor_destroy(handle: *mut Processor) {
    if handle.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(handle));
    }
}

/// Process `frame_count * channels` interleaved samples in place.
/// Returns `0` on success, `-1` if `handle` or `samples` is null.
#[no_mangle]
pub extern "C" fn processor_process(
    handle: *mut Processor,
    samples: *mut f32,
    frame_count: u32,
    channels: u32,
    sample_rate: f32,
) -> i32 {
    if handle.is_null() || samples.is_null() {
        return -1;
    }
    let processor = unsafe { &mut *handle };
    let len = frame_count as usize * channels as usize;
    let slice = unsafe { std::slice::from_raw_parts_mut(samples, len) };
    let mut block = AudioBlock::new(slice, frame_count as usize, channels as usize, sample_rate);
    processor.process(&mut block);
    0
}

/// Apply a wire-encoded [`wire::Command`] and write the wire-encoded
/// [`wire::Response`] into `out`. Returns the number of bytes written, or
/// `-1` on a null handle/buffer or malformed command, in which case
/// nothing is written to `out`.
#[no_mangle]
pub extern "C" fn processor_handle_command(
    handle: *mut Processor,
    cmd_bytes: *const u8,
    cmd_len: usize,
    out: *mut u8,
    out_cap: usize,
) -> i64 {
    if out.is_null() {
        return -1;
    }
    let out_slice = unsafe { std::slice::from_raw_parts_mut(out, out_cap) };

    if handle.is_null() {
        let resp = wire::Response::err(ProcessorState::default(), "processor not initialized");
        return write_response(&resp, out_slice);
    }
    let processor = unsafe { &mut *handle };

    if cmd_bytes.is_null() {
        let resp = wire::Response::err(processor.get_state(), "command buffer is null");
        return write_response(&resp, out_slice);
    }
    let cmd_slice = unsafe { std::slice::from_raw_parts(cmd_bytes, cmd_len) };

    let resp = match wire::Command::decode(cmd_slice) {
        Ok(cmd) => dispatch(processor, cmd),
        Err(e) => wire::Response::err(processor.get_state(), e.to_string()),
    };
    write_response(&resp, out_slice)
}

fn write_response(resp: &wire::Response, out: &mut [u8]) -> i64 {
    let encoded = resp.encode();
    if encoded.len() > out.len() {
        return -1;
    }
    out[..encoded.len()].copy_from_slice(&encoded);
    encoded.len() as i64
}

fn dispatch(processor: &mut Processor, cmd: wire::Command) -> wire::Response {
    let Some(cmd_type) = wire::CommandType::from_u8(cmd.cmd_type) else {
        return wire::Response::err(
            processor.get_state(),
            EngineError::UnknownCommand(cmd.cmd_type).to_string(),
        );
    };

    match cmd_type {
        wire::CommandType::SetBypass => processor.set_bypass(cmd.param_int != 0),
        wire::CommandType::SetPreset => {
            if let Some(preset) = EqPreset::from_u8(cmd.param_int as u8) {
                processor.set_eq_preset(preset);
            }
        }
        wire::CommandType::SetNormalizerTarget => processor.set_normalizer_target(cmd.param_float),
        wire::CommandType::SetCompressionMode => {
            if let Some(mode) = CompressionMode::from_u8(cmd.param_int as u8) {
                processor.set_compression_mode(mode);
            }
        }
        wire::CommandType::SetNoiseMode => {
            if let Some(mode) = NoiseReductionMode::from_u8(cmd.param_int as u8) {
                processor.set_noise_reduction_mode(mode);
            }
        }
        wire::CommandType::SetEqBand => {
            processor.set_eq_band(cmd.param_int.max(0) as usize, cmd.param_float);
        }
        wire::CommandType::StartNoiseLearn => processor.start_noise_learning(),
        wire::CommandType::StopNoiseLearn => processor.stop_noise_learning(),
        wire::CommandType::Reset => processor.reset(),
        wire::CommandType::GetState | wire::CommandType::GetLevels => {}
    }

    wire::Response::ok(processor.get_state())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_destroy_round_trip() {
        let handle = processor_new(48_000.0, 2);
        assert!(!handle.is_null());
        processor_destroy(handle);
    }

    #[test]
    fn new_rejects_zero_channels() {
        assert!(processor_new(48_000.0, 0).is_null());
    }

    #[test]
    fn process_null_handle_is_an_error_code() {
        let mut samples = [0.0f32; 4];
        let rc = processor_process(ptr::null_mut(), samples.as_mut_ptr(), 2, 2, 48_000.0);
        assert_eq!(rc, -1);
    }

    #[test]
    fn process_runs_silence_through_without_panicking() {
        let handle = processor_new(48_000.0, 2);
        let mut samples = [0.0f32; 8];
        let rc = processor_process(handle, samples.as_mut_ptr(), 4, 2, 48_000.0);
        assert_eq!(rc, 0);
        processor_destroy(handle);
    }

    #[test]
    fn handle_command_on_null_processor_reports_uninitialized() {
        let cmd = wire::Command {
            cmd_type: wire::CommandType::GetState as u8,
            param_int: 0,
            param_float: 0.0,
            param_string: String::new(),
            param_bytes: Vec::new(),
        };
        let encoded = cmd.encode();
        let mut out = [0u8; 256];
        let n = processor_handle_command(
            ptr::null_mut(),
            encoded.as_ptr(),
            encoded.len(),
            out.as_mut_ptr(),
            out.len(),
        );
        assert!(n > 0);
        let resp = wire::Response::decode(&out[..n as usize]).unwrap();
        assert!(!resp.success);
    }

    #[test]
    fn handle_command_set_bypass_round_trips_through_state() {
        let handle = processor_new(48_000.0, 2);
        let cmd = wire::Command {
            cmd_type: wire::CommandType::SetBypass as u8,
            param_int: 1,
            param_float: 0.0,
            param_string: String::new(),
            param_bytes: Vec::new(),
        };
        let encoded = cmd.encode();
        let mut out = [0u8; 256];
        let n = processor_handle_command(
            handle,
            encoded.as_ptr(),
            encoded.len(),
            out.as_mut_ptr(),
            out.len(),
        );
        assert!(n > 0);
        let resp = wire::Response::decode(&out[..n as usize]).unwrap();
        assert!(resp.success);
        assert!(resp.state.bypass);
        processor_destroy(handle);
    }

    #[test]
    fn handle_command_unknown_cmd_type_reports_failure() {
        let handle = processor_new(48_000.0, 2);
        let cmd = wire::Command {
            cmd_type: 200,
            param_int: 0,
            param_float: 0.0,
            param_string: String::new(),
            param_bytes: Vec::new(),
        };
        let encoded = cmd.encode();
        let mut out = [0u8; 256];
        let n = processor_handle_command(
            handle,
            encoded.as_ptr(),
            encoded.len(),
            out.as_mut_ptr(),
            out.len(),
        );
        assert!(n > 0);
        let resp = wire::Response::decode(&out[..n as usize]).unwrap();
        assert!(!resp.success);
        processor_destroy(handle);
    }
}
