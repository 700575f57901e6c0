// Feetech STS-series serial bus, position mode
//
// Frame: [0xFF, 0xFF, ID, Length, Instruction | Status, Params..., Checksum]
// where Length counts everything after itself and the checksum is the
// inverted low byte of the sum from ID through the last param.

use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BAUDRATE: u32 = 1_000_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 20;

const HEADER: [u8; 2] = [0xFF, 0xFF];

#[repr(u8)]
#[derive(Debug, Clone, Copy)]
enum Instruction {
    Ping = 0x01,
    Read = 0x02,
    Write = 0x03,
}

/// Control table addresses used by the leg driver
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Register {
    OperatingMode = 33,   // 0 = position
    TorqueEnable = 40,    // 0 = off, 1 = on
    GoalPosition = 42,    // 2 bytes, followed by goal time (2) and goal speed (2)
    Lock = 55,            // 0 = unlocked, 1 = locked
    PresentPosition = 56, // 2 bytes, read-only
}

#[derive(Debug, thiserror::Error)]
pub enum FeetechError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response from servo {id}: {reason}")]
    InvalidResponse { id: u8, reason: String },

    #[error("Checksum mismatch for servo {id}")]
    ChecksumMismatch { id: u8 },

    #[error("Servo {id} returned error status: 0x{status:02X}")]
    ServoError { id: u8, status: u8 },

    #[error("Timeout waiting for response from servo {id}")]
    Timeout { id: u8 },
}

pub type Result<T> = std::result::Result<T, FeetechError>;

pub struct FeetechBus {
    port: Box<dyn SerialPort>,
}

impl FeetechBus {
    pub fn open(port_name: &str) -> Result<Self> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;
        Ok(Self { port })
    }

    fn checksum(body: &[u8]) -> u8 {
        !body.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
    }

    fn frame(id: u8, instruction: Instruction, params: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(6 + params.len());
        frame.extend_from_slice(&HEADER);
        frame.push(id);
        frame.push(params.len() as u8 + 2);
        frame.push(instruction as u8);
        frame.extend_from_slice(params);
        frame.push(Self::checksum(&frame[2..]));
        frame
    }

    /// Send one instruction and return the params of the servo's status reply
    fn transact(&mut self, id: u8, instruction: Instruction, params: &[u8]) -> Result<Vec<u8>> {
        let frame = Self::frame(id, instruction, params);
        self.port.write_all(&frame)?;
        self.port.flush()?;

        let mut head = [0u8; 4];
        self.port.read_exact(&mut head).map_err(|e| match e.kind() {
            ErrorKind::TimedOut => FeetechError::Timeout { id },
            _ => FeetechError::Io(e),
        })?;
        Self::parse_status(id, head, |buf| self.port.read_exact(buf))
    }

    /// Validate a status frame given its first four bytes; `read_rest`
    /// fills the remaining `Length` bytes.
    fn parse_status(
        id: u8,
        head: [u8; 4],
        mut read_rest: impl FnMut(&mut [u8]) -> std::io::Result<()>,
    ) -> Result<Vec<u8>> {
        if head[..2] != HEADER {
            return Err(FeetechError::InvalidResponse {
                id,
                reason: format!("bad header {:02X?}", &head[..2]),
            });
        }
        if head[2] != id {
            return Err(FeetechError::InvalidResponse {
                id,
                reason: format!("reply from servo {}", head[2]),
            });
        }
        let length = head[3] as usize;
        if length < 2 {
            return Err(FeetechError::InvalidResponse {
                id,
                reason: format!("length {} too short", length),
            });
        }

        // status byte, params, checksum
        let mut rest = vec![0u8; length];
        read_rest(&mut rest)?;
        let (body, checksum) = rest.split_at(length - 1);
        let mut summed = vec![head[2], head[3]];
        summed.extend_from_slice(body);
        if Self::checksum(&summed) != checksum[0] {
            return Err(FeetechError::ChecksumMismatch { id });
        }
        if body[0] != 0 {
            return Err(FeetechError::ServoError {
                id,
                status: body[0],
            });
        }
        Ok(body[1..].to_vec())
    }

    /// True if a servo answers on `id`
    pub fn ping(&mut self, id: u8) -> Result<bool> {
        match self.transact(id, Instruction::Ping, &[]) {
            Ok(_) => Ok(true),
            Err(FeetechError::Timeout { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn write(&mut self, id: u8, register: Register, data: &[u8]) -> Result<()> {
        let mut params = Vec::with_capacity(1 + data.len());
        params.push(register as u8);
        params.extend_from_slice(data);
        debug!("Write servo {}: reg={:?} data={:02X?}", id, register, data);
        self.transact(id, Instruction::Write, &params)?;
        Ok(())
    }

    pub fn read_u16(&mut self, id: u8, register: Register) -> Result<u16> {
        let data = self.transact(id, Instruction::Read, &[register as u8, 2])?;
        match data[..] {
            [lo, hi, ..] => Ok(u16::from_le_bytes([lo, hi])),
            _ => Err(FeetechError::InvalidResponse {
                id,
                reason: format!("expected 2 bytes, got {}", data.len()),
            }),
        }
    }

    pub fn set_torque(&mut self, id: u8, enabled: bool) -> Result<()> {
        self.write(id, Register::TorqueEnable, &[enabled as u8])?;
        self.write(id, Register::Lock, &[enabled as u8])
    }

    /// Switch to position mode (torque must be off)
    pub fn set_position_mode(&mut self, id: u8) -> Result<()> {
        self.write(id, Register::OperatingMode, &[0])
    }

    /// Move toward `position` (steps) at `speed` (steps/s); goal time left at 0
    pub fn set_goal(&mut self, id: u8, position: u16, speed: u16) -> Result<()> {
        let [p_lo, p_hi] = position.to_le_bytes();
        let [s_lo, s_hi] = speed.to_le_bytes();
        self.write(id, Register::GoalPosition, &[p_lo, p_hi, 0, 0, s_lo, s_hi])
    }

    pub fn present_position(&mut self, id: u8) -> Result<u16> {
        self.read_u16(id, Register::PresentPosition)
    }
}
