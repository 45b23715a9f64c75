//! # Wire Format
//!
//! Bounds-checked decoding of the PCI inventory OEM message.
//!
//! ## Packet Layout
//! ```text
//! ┌────────┬────────┬─────┬─────┬──────┬────────┬────────┬──────────┬─────┐
//! │ reset  │ domain │ bus │ dev │ func │ vendor │ device │  class   │ rev │
//! │   1    │  2 BE  │  1  │  1  │  1   │  2 BE  │  2 BE  │   4 BE   │  1  │
//! └────────┴────────┴─────┴─────┴──────┴────────┴────────┴──────────┴─────┘
//!  offset 0   1       3     4     5      6        8        10         14
//! ```
//!
//! Host firmware prefixes the request with a 3-byte IANA number; the IPMI
//! stack uses it to route the OEM command and strips it, so it is not part of
//! the payload seen here.

use crate::device::{DeviceDescriptor, PciAddress};
use crate::error::DecodeError;

/// Size of the packed device record.
pub const DEVICE_RECORD_LEN: usize = 14;

/// Size of the whole message: reset flag + device record.
pub const MESSAGE_LEN: usize = 1 + DEVICE_RECORD_LEN;

/// Decoded OEM message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PciMessage {
    /// Host asks to forget previously reported devices.
    pub reset: bool,
    /// Device carried by this message.
    pub device: DeviceDescriptor,
}

impl PciMessage {
    /// Decodes a full message. The payload must be exactly [`MESSAGE_LEN`]
    /// bytes long.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let bytes: &[u8; MESSAGE_LEN] =
            payload
                .try_into()
                .map_err(|_| DecodeError::InvalidLength {
                    expected: MESSAGE_LEN,
                    actual: payload.len(),
                })?;

        let (flag, record) = bytes.split_at(1);
        Ok(PciMessage {
            reset: flag[0] != 0,
            device: DeviceDescriptor::from_be_bytes(record)?,
        })
    }
}

impl DeviceDescriptor {
    /// Decodes a big-endian device record of exactly [`DEVICE_RECORD_LEN`]
    /// bytes, converting every multi-byte field to host order.
    pub fn from_be_bytes(record: &[u8]) -> Result<Self, DecodeError> {
        let r: &[u8; DEVICE_RECORD_LEN] =
            record
                .try_into()
                .map_err(|_| DecodeError::InvalidLength {
                    expected: DEVICE_RECORD_LEN,
                    actual: record.len(),
                })?;

        let address = PciAddress::new(u16::from_be_bytes([r[0], r[1]]), r[2], r[3], r[4]);
        let vendor_id = u16::from_be_bytes([r[5], r[6]]);
        let device_id = u16::from_be_bytes([r[7], r[8]]);
        let class_code = u32::from_be_bytes([r[9], r[10], r[11], r[12]]);
        let revision = r[13];

        Ok(DeviceDescriptor::new(
            address, vendor_id, device_id, class_code, revision,
        ))
    }

    /// Encodes the descriptor back into its big-endian record.
    pub fn to_be_bytes(&self) -> [u8; DEVICE_RECORD_LEN] {
        let addr = self.address();
        let mut out = [0u8; DEVICE_RECORD_LEN];
        out[0..2].copy_from_slice(&addr.domain.to_be_bytes());
        out[2] = addr.bus;
        out[3] = addr.device;
        out[4] = addr.function;
        out[5..7].copy_from_slice(&self.vendor_id().to_be_bytes());
        out[7..9].copy_from_slice(&self.device_id().to_be_bytes());
        out[9..13].copy_from_slice(&self.class_code().to_be_bytes());
        out[13] = self.revision();
        out
    }
}

impl PciMessage {
    /// Encodes the message as host firmware would send it (minus IANA).
    pub fn encode(&self) -> [u8; MESSAGE_LEN] {
        let mut out = [0u8; MESSAGE_LEN];
        out[0] = u8::from(self.reset);
        out[1..].copy_from_slice(&self.device.to_be_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISA_BRIDGE: [u8; MESSAGE_LEN] = [
        0x01, // reset
        0x00, 0x00, // domain
        0x00, 0x1f, 0x00, // bus, device, function
        0x80, 0x86, // vendor
        0xa1, 0xb2, // device
        0x00, 0x06, 0x01, 0x00, // class
        0x03, // revision
    ];

    #[test]
    fn test_decode_big_endian() {
        let msg = PciMessage::decode(&ISA_BRIDGE).unwrap();
        assert!(msg.reset);
        assert_eq!(msg.device.vendor_id(), 0x8086);
        assert_eq!(msg.device.device_id(), 0xa1b2);
        assert_eq!(msg.device.class_code(), 0x060100);
        assert_eq!(msg.device.revision(), 0x03);
        assert_eq!(msg.device.key(), "PCI0000001f0");
        assert_eq!(msg.device.label(), "ISA bridge");
    }

    #[test]
    fn test_domain_byte_order() {
        let mut raw = ISA_BRIDGE;
        raw[1] = 0x12;
        raw[2] = 0x34;
        let msg = PciMessage::decode(&raw).unwrap();
        assert_eq!(msg.device.address().domain, 0x1234);
        assert_eq!(msg.device.location(), "1234:00:1f.0");
    }

    #[test]
    fn test_any_nonzero_flag_is_reset() {
        let mut raw = ISA_BRIDGE;
        raw[0] = 0x00;
        assert!(!PciMessage::decode(&raw).unwrap().reset);
        raw[0] = 0x7f;
        assert!(PciMessage::decode(&raw).unwrap().reset);
    }

    #[test]
    fn test_rejects_short_and_long_payloads() {
        assert_eq!(
            PciMessage::decode(&ISA_BRIDGE[..10]),
            Err(DecodeError::InvalidLength {
                expected: MESSAGE_LEN,
                actual: 10
            })
        );

        let mut long = ISA_BRIDGE.to_vec();
        long.push(0);
        assert!(PciMessage::decode(&long).is_err());
        assert!(PciMessage::decode(&[]).is_err());
    }

    #[test]
    fn test_encode_matches_firmware_layout() {
        let msg = PciMessage::decode(&ISA_BRIDGE).unwrap();
        assert_eq!(msg.encode(), ISA_BRIDGE);
    }
}
