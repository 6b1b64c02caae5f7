//! Terminal output helpers shared by the binary.
//!
//! Each line carries a coloured tag: `[!]` for warnings, `[~]` for details
//! and `[>]` for results. Accessible mode drops the tag and greppable mode
//! drops the line, so only the machine-readable summary is left on stdout.

#[doc(hidden)]
#[macro_export]
macro_rules! tagged_line {
    ($tag:expr, $name:expr, $greppable:expr, $accessible:expr) => {
        if !$greppable {
            if $accessible {
                println!("{}", $name);
            } else {
                println!("{} {}", $tag, $name);
            }
        }
    };
}

/// Prints a red `[!]` line.
///
/// The one-argument form always prints; it is used for errors that end the
/// run before any output mode applies.
#[macro_export]
macro_rules! warning {
    ($name:expr) => {
        println!("{} {}", ansi_term::Colour::Red.bold().paint("[!]"), $name);
    };
    ($name:expr, $greppable:expr, $accessible:expr) => {
        $crate::tagged_line!(
            ansi_term::Colour::Red.bold().paint("[!]"),
            $name,
            $greppable,
            $accessible
        );
    };
}

/// Prints a blue `[~]` line unless output is greppable.
#[macro_export]
macro_rules! detail {
    ($name:expr, $greppable:expr, $accessible:expr) => {
        $crate::tagged_line!(
            ansi_term::Colour::Blue.bold().paint("[~]"),
            $name,
            $greppable,
            $accessible
        );
    };
}

/// Prints a green `[>]` line unless output is greppable.
#[macro_export]
macro_rules! output {
    ($name:expr, $greppable:expr, $accessible:expr) => {
        $crate::tagged_line!(
            ansi_term::Colour::RGB(0, 255, 9).bold().paint("[>]"),
            $name,
            $greppable,
            $accessible
        );
    };
}
