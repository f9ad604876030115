//! Keyboard-to-wire mapping.

use shared::Direction;

/// The byte to send for a pressed key, if the key is a movement command.
/// Commands go on the wire lowercased; the server accepts either case.
pub fn command_for(byte: u8) -> Option<u8> {
    Direction::from_byte(byte).map(|_| byte.to_ascii_lowercase())
}

pub fn is_quit(byte: u8) -> bool {
    byte.to_ascii_lowercase() == b'q'
}
