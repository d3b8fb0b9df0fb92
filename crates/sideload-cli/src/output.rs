//! Broken-pipe-safe stdout printing.
//!
//! When output is piped into something like `head`, the pipe can close
//! under us; treat that as a clean early exit rather than a panic.

use std::io::Write as _;

#[allow(clippy::exit, reason = "A closed stdout pipe ends the program cleanly")]
pub fn emit(args: std::fmt::Arguments<'_>) {
    if writeln!(std::io::stdout(), "{args}").is_err() {
        std::process::exit(0);
    }
}

/// `println!` that exits cleanly when stdout's pipe has closed.
#[macro_export]
macro_rules! outln {
    () => {
        $crate::output::emit(format_args!(""))
    };
    ($($arg:tt)*) => {
        $crate::output::emit(format_args!($($arg)*))
    };
}
