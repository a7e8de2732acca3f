pub mod tape;
pub mod decode;
pub mod channel;
pub mod machine;
pub mod amplifier;
pub mod gravity;
pub mod disasm;
