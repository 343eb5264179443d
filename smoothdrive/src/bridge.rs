//! Length-prefixed frame stream between the host plugin and the core.
//! Each frame is a little-endian `u32` length followed by a MessagePack body.

use crate::error::FrameError;
use crate::result::FrameResult;
use crate::Driver;
use log::warn;
use shared::{TickInput, TickOutput};
use std::io::{ErrorKind, Read, Write};

pub const MAX_FRAME_SIZE: usize = 1 << 20;

/// Reads one frame body. `Ok(None)` on a clean end of stream.
pub fn read_frame<R: Read>(reader: &mut R) -> FrameResult<Option<Vec<u8>>> {
    let mut len_buf = [0; 4];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(FrameError::Read(e)),
    }
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        // Drain the body so the next frame starts on a boundary.
        std::io::copy(&mut reader.by_ref().take(len as u64), &mut std::io::sink()).map_err(FrameError::Read)?;
        return Err(FrameError::TooLarge(len));
    }
    let mut buf = vec![0; len];
    reader.read_exact(&mut buf).map_err(FrameError::Read)?;
    Ok(Some(buf))
}

pub fn write_frame<W: Write>(writer: &mut W, data: &[u8]) -> FrameResult<()> {
    if data.len() > MAX_FRAME_SIZE {
        return Err(FrameError::TooLarge(data.len()));
    }
    writer
        .write_all(&(data.len() as u32).to_le_bytes())
        .map_err(FrameError::Write)?;
    writer.write_all(data).map_err(FrameError::Write)?;
    writer.flush().map_err(FrameError::Write)
}

pub fn read_input<R: Read>(reader: &mut R) -> FrameResult<Option<TickInput>> {
    match read_frame(reader)? {
        Some(data) => Ok(Some(TickInput::from_bytes(&data)?)),
        None => Ok(None),
    }
}

pub fn write_output<W: Write>(writer: &mut W, output: &TickOutput) -> FrameResult<()> {
    let data = output.to_bytes()?;
    write_frame(writer, &data)
}

/// Runs ticks until the input ends. Frames that fail to decode are
/// skipped; I/O errors end the loop.
pub fn serve<R: Read, W: Write>(driver: &mut Driver, reader: &mut R, writer: &mut W) -> FrameResult<u64> {
    let mut ticks = 0;
    loop {
        let input = match read_input(reader) {
            Ok(Some(input)) => input,
            Ok(None) => return Ok(ticks),
            Err(e @ FrameError::Decode(_)) | Err(e @ FrameError::TooLarge(_)) => {
                warn!("Skipping frame: {}", e);
                continue;
            }
            Err(e) => return Err(e),
        };
        let output = driver.tick(&input);
        write_output(writer, &output)?;
        ticks += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::gear_profiles::GearProfiles;
    use std::io::Cursor;

    #[test]
    fn frames_round_trip_through_a_buffer() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello").unwrap();
        write_frame(&mut buf, b"").unwrap();
        assert_eq!(&buf[0..4], &[5, 0, 0, 0]);

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_frame(&mut cursor).unwrap(), Some(b"hello".to_vec()));
        assert_eq!(read_frame(&mut cursor).unwrap(), Some(Vec::new()));
        assert_eq!(read_frame(&mut cursor).unwrap(), None);
    }

    #[test]
    fn truncated_body_is_an_error() {
        let mut cursor = Cursor::new(vec![10, 0, 0, 0, 1, 2]);
        assert!(matches!(read_frame(&mut cursor), Err(FrameError::Read(_))));
    }

    #[test]
    fn oversized_frame_is_skipped_whole() {
        let mut buf = Vec::new();
        let len = (MAX_FRAME_SIZE + 1) as u32;
        buf.extend_from_slice(&len.to_le_bytes());
        buf.resize(buf.len() + MAX_FRAME_SIZE + 1, 0);
        write_frame(&mut buf, b"next").unwrap();

        let mut cursor = Cursor::new(buf);
        assert!(matches!(read_frame(&mut cursor), Err(FrameError::TooLarge(_))));
        assert_eq!(read_frame(&mut cursor).unwrap(), Some(b"next".to_vec()));
    }

    #[test]
    fn serve_skips_garbage_and_answers_each_tick() {
        let mut input = Vec::new();
        let tick = TickInput {
            dt: 1.0 / 60.0,
            ..Default::default()
        };
        write_frame(&mut input, &tick.to_bytes().unwrap()).unwrap();
        write_frame(&mut input, &[0xc1]).unwrap();
        write_frame(&mut input, &tick.to_bytes().unwrap()).unwrap();

        let mut driver = Driver::new(Config::default(), GearProfiles::default());
        let mut output = Vec::new();
        let ticks = serve(&mut driver, &mut Cursor::new(input), &mut output).unwrap();
        assert_eq!(ticks, 2);

        let mut cursor = Cursor::new(output);
        let first = read_frame(&mut cursor).unwrap().unwrap();
        let decoded = TickOutput::from_bytes(&first).unwrap();
        assert!(decoded.overrides.runtime);
        assert!(decoded.vehicle.is_none());
    }
}
