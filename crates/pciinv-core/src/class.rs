//! # Class Code Labels
//!
//! Maps a 24-bit PCI class code to the human-readable name shown as the
//! inventory item's `PrettyName`.
//!
//! ## Lookup Levels
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      class_code = 0xCC_SS_PP                            │
//! │                                                                         │
//! │  CC (class)      ──► unknown ─────────────► "Unclassified device"       │
//! │     │                                                                   │
//! │  SS (subclass)   ──► unknown ─────────────► generic class label         │
//! │     │                                                                   │
//! │  PP (prog-if)    ──► only for 0x0c/0x03 (USB); unknown ──► "USB"        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Names follow the PCI ID repository class list
//! (<https://pci-ids.ucw.cz/read/PD>).

/// Label used when the class byte itself is not known.
pub const UNCLASSIFIED_LABEL: &str = "Unclassified device";

/// Returns the label for a class code. Bits above the low 24 are ignored.
///
/// Total over every `u32`: each input maps to a non-empty static string.
pub fn class_label(class_code: u32) -> &'static str {
    let class = (class_code >> 16) as u8;
    let subclass = (class_code >> 8) as u8;
    let prog_if = class_code as u8;

    match class {
        0x00 => match subclass {
            0x00 => "Non-VGA unclassified device",
            0x01 => "VGA compatible unclassified device",
            _ => UNCLASSIFIED_LABEL,
        },
        0x01 => match subclass {
            0x00 => "SCSI storage controller",
            0x01 => "IDE interface",
            0x02 => "Floppy disk controller",
            0x03 => "IPI bus controller",
            0x04 => "RAID bus controller",
            0x05 => "ATA controller",
            0x06 => "SATA controller",
            0x07 => "Serial Attached SCSI controller",
            0x08 => "Non-Volatile memory controller",
            _ => "Mass storage controller",
        },
        0x02 => match subclass {
            0x00 => "Ethernet controller",
            0x01 => "Token ring network controller",
            0x02 => "FDDI network controller",
            0x03 => "ATM network controller",
            0x04 => "ISDN controller",
            0x05 => "WorldFip controller",
            0x06 => "PICMG controller",
            0x07 => "Infiniband controller",
            0x08 => "Fabric controller",
            _ => "Network controller",
        },
        0x03 => match subclass {
            0x00 => "VGA compatible controller",
            0x01 => "XGA compatible controller",
            0x02 => "3D controller",
            _ => "Display controller",
        },
        0x04 => match subclass {
            0x00 => "Multimedia video controller",
            0x01 => "Multimedia audio controller",
            0x02 => "Computer telephony device",
            0x03 => "Audio device",
            _ => "Multimedia controller",
        },
        0x05 => match subclass {
            0x00 => "RAM memory",
            0x01 => "FLASH memory",
            _ => "Memory controller",
        },
        0x06 => match subclass {
            0x00 => "Host bridge",
            0x01 => "ISA bridge",
            0x02 => "EISA bridge",
            0x03 => "MicroChannel bridge",
            0x04 => "PCI bridge",
            0x05 => "PCMCIA bridge",
            0x06 => "NuBus bridge",
            0x07 => "CardBus bridge",
            0x08 => "RACEway bridge",
            0x09 => "Semi-transparent PCI-to-PCI bridge",
            0x0a => "InfiniBand to PCI host bridge",
            _ => "Bridge",
        },
        0x07 => match subclass {
            0x00 => "Serial controller",
            0x01 => "Parallel controller",
            0x02 => "Multiport serial controller",
            0x03 => "Modem",
            0x04 => "GPIB controller",
            0x05 => "Smart Card controller",
            _ => "Communication controller",
        },
        0x08 => match subclass {
            0x00 => "PIC",
            0x01 => "DMA controller",
            0x02 => "Timer",
            0x03 => "RTC",
            0x04 => "PCI Hot-plug controller",
            0x05 => "SD Host controller",
            0x06 => "IOMMU",
            _ => "System peripheral",
        },
        0x09 => match subclass {
            0x00 => "Keyboard controller",
            0x01 => "Digitizer Pen",
            0x02 => "Mouse controller",
            0x03 => "Scanner controller",
            0x04 => "Gameport controller",
            _ => "Input device controller",
        },
        0x0a => match subclass {
            0x00 => "Generic Docking Station",
            _ => "Docking Station",
        },
        0x0b => match subclass {
            0x00 => "386",
            0x01 => "486",
            0x02 => "Pentium",
            0x10 => "Alpha",
            0x20 => "Power PC",
            0x30 => "MIPS",
            0x40 => "Co-processor",
            _ => "CPU",
        },
        0x0c => match subclass {
            0x00 => "FireWire (IEEE 1394)",
            0x01 => "ACCESS Bus",
            0x02 => "SSA",
            0x03 => usb_label(prog_if),
            0x04 => "Fibre Channel",
            0x05 => "SMBus",
            0x06 => "InfiniBand",
            0x07 => "IPMI Interface",
            0x08 => "SERCOS interface",
            0x09 => "CANBUS",
            _ => "Serial bus controller",
        },
        0x0d => match subclass {
            0x00 => "IRDA controller",
            0x01 => "Consumer IR controller",
            0x10 => "RF controller",
            0x11 => "Bluetooth",
            0x12 => "Broadband",
            0x20 => "802.1a controller",
            0x21 => "802.1b controller",
            _ => "Wireless controller",
        },
        0x0e => "Intelligent controller",
        0x0f => match subclass {
            0x01 => "Satellite TV controller",
            0x02 => "Satellite audio communication controller",
            0x03 => "Satellite voice communication controller",
            0x04 => "Satellite data communication controller",
            _ => "Satellite communications controller",
        },
        0x10 => match subclass {
            0x00 => "Network and computing encryption device",
            0x01 => "Entertainment encryption device",
            _ => "Encryption controller",
        },
        0x11 => match subclass {
            0x00 => "DPIO module",
            0x01 => "Performance counters",
            0x10 => "Communication synchronizer",
            0x20 => "Signal processing management",
            _ => "Signal processing controller",
        },
        0x12 => "Processing accelerators",
        0x13 => "Non-Essential Instrumentation",
        0x40 => "Coprocessor",
        _ => UNCLASSIFIED_LABEL,
    }
}

fn usb_label(prog_if: u8) -> &'static str {
    match prog_if {
        0x00 => "USB-UHCI",
        0x10 => "USB-OHCI",
        0x20 => "USB-EHCI",
        0x30 => "USB-XHCI",
        0xfe => "USB Device",
        _ => "USB",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert_eq!(class_label(0x060100), "ISA bridge");
        assert_eq!(class_label(0x020000), "Ethernet controller");
        assert_eq!(class_label(0x010802), "Non-Volatile memory controller");
        assert_eq!(class_label(0x030000), "VGA compatible controller");
    }

    #[test]
    fn test_subclass_fallback() {
        assert_eq!(class_label(0x028000), "Network controller");
        assert_eq!(class_label(0x06ff00), "Bridge");
        assert_eq!(class_label(0x00ee00), UNCLASSIFIED_LABEL);
    }

    #[test]
    fn test_usb_prog_if() {
        assert_eq!(class_label(0x0c0330), "USB-XHCI");
        assert_eq!(class_label(0x0c0320), "USB-EHCI");
        assert_eq!(class_label(0x0c03fe), "USB Device");
        assert_eq!(class_label(0x0c0380), "USB");
    }

    #[test]
    fn test_prog_if_ignored_outside_usb() {
        assert_eq!(class_label(0x060100), class_label(0x0601ff));
        assert_eq!(class_label(0x0c0500), class_label(0x0c0542));
    }

    #[test]
    fn test_unknown_class() {
        assert_eq!(class_label(0xff0000), UNCLASSIFIED_LABEL);
        assert_eq!(class_label(0x140000), UNCLASSIFIED_LABEL);
    }

    #[test]
    fn test_upper_byte_ignored() {
        assert_eq!(class_label(0xab06_0100), "ISA bridge");
    }

    #[test]
    fn test_total_over_24_bit_domain() {
        for code in 0..=0x00ff_ffffu32 {
            assert!(!class_label(code).is_empty(), "empty label for {code:#08x}");
        }
    }
}
