//! PJLink command catalog.
//!
//! Every command the engine issues is a fixed byte template from this
//! table: the exact request bytes (terminated by 0x0D), the four-letter
//! response tag used to validate replies, the PJLink class the command
//! belongs to, and the offsets of any parameter bytes.
//!
//! Catalog entries are immutable, process-wide templates. Commands with
//! variable parameters reserve `0x00` placeholder bytes at fixed offsets;
//! [`Command::patched`] copies the template into a fresh buffer before
//! writing the parameter bytes, so a template is never mutated in place.
//!
//! # Request format
//!
//! ```text
//! %<class><TAG> <param>\r
//! ```
//!
//! A response to a query echoes the tag after the class digit, e.g.
//! `%1POWR ?\r` is answered by `%1POWR=1\r`. The special [`BLANK`]
//! command has no bytes at all; the retry loop sends it to pull the next
//! queued response off the socket without issuing a new request.

use bytes::{BufMut, BytesMut};

use pjlink_core::types::DeviceClass;

/// One immutable catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    bytes: &'static [u8],
    tag: &'static str,
    class: DeviceClass,
    param_offsets: &'static [usize],
}

impl Command {
    /// The raw request template, 0x0D terminator included.
    pub fn bytes(&self) -> &'static [u8] {
        self.bytes
    }

    /// The four-letter tag echoed in the device's response (empty for
    /// [`BLANK`]).
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// The PJLink class this command belongs to.
    pub fn class(&self) -> DeviceClass {
        self.class
    }

    /// Copy the template into an owned buffer, unmodified.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Copy the template and write `params` at the reserved offsets.
    ///
    /// `params` must supply exactly one byte per reserved offset; the
    /// catalog entry itself is left untouched.
    pub fn patched(&self, params: &[u8]) -> Vec<u8> {
        debug_assert_eq!(
            params.len(),
            self.param_offsets.len(),
            "parameter count mismatch for {}",
            self.tag
        );
        let mut buf = BytesMut::with_capacity(self.bytes.len());
        buf.put_slice(self.bytes);
        for (offset, value) in self.param_offsets.iter().zip(params) {
            buf[*offset] = *value;
        }
        buf.to_vec()
    }
}

// ---------------------------------------------------------------
// Class 1 commands
// ---------------------------------------------------------------

/// Set power state; the data byte takes `'1'` (on) or `'0'` (off).
pub const POWER_SET: Command = Command {
    bytes: b"%1POWR \x00\r",
    tag: "POWR",
    class: DeviceClass::Class1,
    param_offsets: &[7],
};

/// Query power state.
pub const POWER_QUERY: Command = Command {
    bytes: b"%1POWR ?\r",
    tag: "POWR",
    class: DeviceClass::Class1,
    param_offsets: &[],
};

/// Switch input; the two data bytes take the input code (e.g. `"31"`).
pub const INPUT_SET: Command = Command {
    bytes: b"%1INPT \x00\x00\r",
    tag: "INPT",
    class: DeviceClass::Class1,
    param_offsets: &[7, 8],
};

/// Query the active input.
pub const INPUT_QUERY: Command = Command {
    bytes: b"%1INPT ?\r",
    tag: "INPT",
    class: DeviceClass::Class1,
    param_offsets: &[],
};

/// Set audio mute; channel byte `'2'` is fixed in the template, the
/// state byte takes `'1'`/`'0'`.
pub const AUDIO_MUTE_SET: Command = Command {
    bytes: b"%1AVMT 2\x00\r",
    tag: "AVMT",
    class: DeviceClass::Class1,
    param_offsets: &[8],
};

/// Set video mute; channel byte `'1'` is fixed in the template, the
/// state byte takes `'1'`/`'0'`.
pub const VIDEO_MUTE_SET: Command = Command {
    bytes: b"%1AVMT 1\x00\r",
    tag: "AVMT",
    class: DeviceClass::Class1,
    param_offsets: &[8],
};

/// Query the combined audio/video mute state.
pub const MUTE_QUERY: Command = Command {
    bytes: b"%1AVMT ?\r",
    tag: "AVMT",
    class: DeviceClass::Class1,
    param_offsets: &[],
};

/// Query the six-digit error status word.
pub const ERROR_STATUS_QUERY: Command = Command {
    bytes: b"%1ERST ?\r",
    tag: "ERST",
    class: DeviceClass::Class1,
    param_offsets: &[],
};

/// Query lamp usage hours and on/off flags.
pub const LAMP_QUERY: Command = Command {
    bytes: b"%1LAMP ?\r",
    tag: "LAMP",
    class: DeviceClass::Class1,
    param_offsets: &[],
};

/// Query the projector/display name.
pub const NAME_QUERY: Command = Command {
    bytes: b"%1NAME ?\r",
    tag: "NAME",
    class: DeviceClass::Class1,
    param_offsets: &[],
};

/// Query manufacturer information.
pub const INFO1_QUERY: Command = Command {
    bytes: b"%1INF1 ?\r",
    tag: "INF1",
    class: DeviceClass::Class1,
    param_offsets: &[],
};

/// Query product information.
pub const INFO2_QUERY: Command = Command {
    bytes: b"%1INF2 ?\r",
    tag: "INF2",
    class: DeviceClass::Class1,
    param_offsets: &[],
};

/// Query other device information.
pub const INFO_QUERY: Command = Command {
    bytes: b"%1INFO ?\r",
    tag: "INFO",
    class: DeviceClass::Class1,
    param_offsets: &[],
};

/// Query the PJLink class the device implements.
pub const CLASS_QUERY: Command = Command {
    bytes: b"%1CLSS ?\r",
    tag: "CLSS",
    class: DeviceClass::Class1,
    param_offsets: &[],
};

// ---------------------------------------------------------------
// Class 2 commands
// ---------------------------------------------------------------

/// Query the serial number.
pub const SERIAL_NUMBER_QUERY: Command = Command {
    bytes: b"%2SNUM ?\r",
    tag: "SNUM",
    class: DeviceClass::Class2,
    param_offsets: &[],
};

/// Query the software version.
pub const SOFTWARE_VERSION_QUERY: Command = Command {
    bytes: b"%2SVER ?\r",
    tag: "SVER",
    class: DeviceClass::Class2,
    param_offsets: &[],
};

/// Query the list of switchable input codes.
pub const INPUT_LIST_QUERY: Command = Command {
    bytes: b"%2INST ?\r",
    tag: "INST",
    class: DeviceClass::Class2,
    param_offsets: &[],
};

/// Query the display name of one input; the two data bytes take the
/// input code from the INST list.
pub const INPUT_NAME_QUERY: Command = Command {
    bytes: b"%2INNM ?\x00\x00\r",
    tag: "INNM",
    class: DeviceClass::Class2,
    param_offsets: &[8, 9],
};

/// Query the resolution of the active input.
pub const INPUT_RESOLUTION_QUERY: Command = Command {
    bytes: b"%2IRES ?\r",
    tag: "IRES",
    class: DeviceClass::Class2,
    param_offsets: &[],
};

/// Query the recommended (native) resolution.
pub const RECOMMENDED_RESOLUTION_QUERY: Command = Command {
    bytes: b"%2RRES ?\r",
    tag: "RRES",
    class: DeviceClass::Class2,
    param_offsets: &[],
};

/// Query filter usage hours.
pub const FILTER_USAGE_QUERY: Command = Command {
    bytes: b"%2FILT ?\r",
    tag: "FILT",
    class: DeviceClass::Class2,
    param_offsets: &[],
};

/// Query the lamp replacement model number.
pub const LAMP_MODEL_QUERY: Command = Command {
    bytes: b"%2RLMP ?\r",
    tag: "RLMP",
    class: DeviceClass::Class2,
    param_offsets: &[],
};

/// Query the filter replacement model number.
pub const FILTER_MODEL_QUERY: Command = Command {
    bytes: b"%2RFIL ?\r",
    tag: "RFIL",
    class: DeviceClass::Class2,
    param_offsets: &[],
};

/// Step speaker volume; the data byte takes `'1'` (up) or `'0'` (down).
pub const SPEAKER_VOLUME_SET: Command = Command {
    bytes: b"%2SVOL \x00\r",
    tag: "SVOL",
    class: DeviceClass::Class2,
    param_offsets: &[7],
};

/// Step microphone volume; the data byte takes `'1'` (up) or `'0'` (down).
pub const MICROPHONE_VOLUME_SET: Command = Command {
    bytes: b"%2MVOL \x00\r",
    tag: "MVOL",
    class: DeviceClass::Class2,
    param_offsets: &[7],
};

/// Set screen freeze; the data byte takes `'1'` (freeze) or `'0'` (run).
pub const FREEZE_SET: Command = Command {
    bytes: b"%2FREZ \x00\r",
    tag: "FREZ",
    class: DeviceClass::Class2,
    param_offsets: &[7],
};

/// Query the freeze state.
pub const FREEZE_QUERY: Command = Command {
    bytes: b"%2FREZ ?\r",
    tag: "FREZ",
    class: DeviceClass::Class2,
    param_offsets: &[],
};

/// The blank command: writes nothing and reads one queued response.
pub const BLANK: Command = Command {
    bytes: b"",
    tag: "",
    class: DeviceClass::Class1,
    param_offsets: &[],
};

#[cfg(test)]
mod tests {
    use super::*;

    // ---------------------------------------------------------------
    // Template byte verification
    // ---------------------------------------------------------------

    #[test]
    fn power_query_bytes() {
        assert_eq!(
            POWER_QUERY.bytes(),
            &[0x25, 0x31, 0x50, 0x4f, 0x57, 0x52, 0x20, 0x3f, 0x0d]
        );
    }

    #[test]
    fn power_set_template_has_placeholder() {
        assert_eq!(
            POWER_SET.bytes(),
            &[0x25, 0x31, 0x50, 0x4f, 0x57, 0x52, 0x20, 0x00, 0x0d]
        );
    }

    #[test]
    fn input_set_template_bytes() {
        assert_eq!(
            INPUT_SET.bytes(),
            &[0x25, 0x31, 0x49, 0x4e, 0x50, 0x54, 0x20, 0x00, 0x00, 0x0d]
        );
    }

    #[test]
    fn mute_set_templates_carry_channel_byte() {
        assert_eq!(
            AUDIO_MUTE_SET.bytes(),
            &[0x25, 0x31, 0x41, 0x56, 0x4d, 0x54, 0x20, 0x32, 0x00, 0x0d]
        );
        assert_eq!(
            VIDEO_MUTE_SET.bytes(),
            &[0x25, 0x31, 0x41, 0x56, 0x4d, 0x54, 0x20, 0x31, 0x00, 0x0d]
        );
    }

    #[test]
    fn input_name_query_template_bytes() {
        assert_eq!(
            INPUT_NAME_QUERY.bytes(),
            &[0x25, 0x32, 0x49, 0x4e, 0x4e, 0x4d, 0x20, 0x3f, 0x00, 0x00, 0x0d]
        );
    }

    #[test]
    fn class_query_bytes() {
        assert_eq!(CLASS_QUERY.bytes(), b"%1CLSS ?\r");
        assert_eq!(CLASS_QUERY.tag(), "CLSS");
    }

    #[test]
    fn class2_commands_use_class2_header() {
        for cmd in [
            SERIAL_NUMBER_QUERY,
            SOFTWARE_VERSION_QUERY,
            INPUT_LIST_QUERY,
            INPUT_NAME_QUERY,
            INPUT_RESOLUTION_QUERY,
            RECOMMENDED_RESOLUTION_QUERY,
            FILTER_USAGE_QUERY,
            LAMP_MODEL_QUERY,
            FILTER_MODEL_QUERY,
            SPEAKER_VOLUME_SET,
            MICROPHONE_VOLUME_SET,
            FREEZE_SET,
            FREEZE_QUERY,
        ] {
            assert_eq!(cmd.class(), DeviceClass::Class2);
            assert_eq!(&cmd.bytes()[..2], b"%2", "wrong header for {}", cmd.tag());
        }
    }

    #[test]
    fn every_command_ends_in_cr() {
        for cmd in [
            POWER_SET,
            POWER_QUERY,
            INPUT_SET,
            INPUT_QUERY,
            AUDIO_MUTE_SET,
            VIDEO_MUTE_SET,
            MUTE_QUERY,
            ERROR_STATUS_QUERY,
            LAMP_QUERY,
            NAME_QUERY,
            INFO1_QUERY,
            INFO2_QUERY,
            INFO_QUERY,
            CLASS_QUERY,
            SERIAL_NUMBER_QUERY,
            SOFTWARE_VERSION_QUERY,
            INPUT_LIST_QUERY,
            INPUT_NAME_QUERY,
            INPUT_RESOLUTION_QUERY,
            RECOMMENDED_RESOLUTION_QUERY,
            FILTER_USAGE_QUERY,
            LAMP_MODEL_QUERY,
            FILTER_MODEL_QUERY,
            SPEAKER_VOLUME_SET,
            MICROPHONE_VOLUME_SET,
            FREEZE_SET,
            FREEZE_QUERY,
        ] {
            assert_eq!(*cmd.bytes().last().unwrap(), 0x0d, "{}", cmd.tag());
        }
    }

    #[test]
    fn blank_command_is_empty() {
        assert!(BLANK.bytes().is_empty());
        assert_eq!(BLANK.tag(), "");
    }

    // ---------------------------------------------------------------
    // Patching
    // ---------------------------------------------------------------

    #[test]
    fn patch_power_on() {
        assert_eq!(POWER_SET.patched(b"1"), b"%1POWR 1\r");
    }

    #[test]
    fn patch_power_off() {
        assert_eq!(POWER_SET.patched(b"0"), b"%1POWR 0\r");
    }

    #[test]
    fn patch_input_code() {
        assert_eq!(INPUT_SET.patched(b"31"), b"%1INPT 31\r");
    }

    #[test]
    fn patch_audio_mute_on() {
        assert_eq!(AUDIO_MUTE_SET.patched(b"1"), b"%1AVMT 21\r");
    }

    #[test]
    fn patch_video_mute_off() {
        assert_eq!(VIDEO_MUTE_SET.patched(b"0"), b"%1AVMT 10\r");
    }

    #[test]
    fn patch_input_name_query() {
        assert_eq!(INPUT_NAME_QUERY.patched(b"11"), b"%2INNM ?11\r");
    }

    #[test]
    fn patch_volume_step() {
        assert_eq!(SPEAKER_VOLUME_SET.patched(b"1"), b"%2SVOL 1\r");
        assert_eq!(SPEAKER_VOLUME_SET.patched(b"0"), b"%2SVOL 0\r");
        assert_eq!(MICROPHONE_VOLUME_SET.patched(b"1"), b"%2MVOL 1\r");
    }

    #[test]
    fn patch_freeze() {
        assert_eq!(FREEZE_SET.patched(b"1"), b"%2FREZ 1\r");
        assert_eq!(FREEZE_SET.patched(b"0"), b"%2FREZ 0\r");
    }

    #[test]
    fn patch_does_not_mutate_template() {
        let _ = POWER_SET.patched(b"1");
        // The template still carries its 0x00 placeholder.
        assert_eq!(POWER_SET.bytes()[7], 0x00);
    }
}
