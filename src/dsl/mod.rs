//! The circuit definition language.
//!
//! A definition file names its devices, wires their pins together, and
//! lists the points to monitor. The language is brace-delimited with
//! semicolon-terminated items, which gives error recovery stable
//! synchronisation points.
//!
//! # Grammar
//!
//! ```text
//! network      = "CIRCUIT" "{" devices connections monitors "}" "END"
//! devices      = "DEVICES" "{" device { device } "}"
//! device       = name { "," name } "=" devspec ";"
//! devspec      = "SWITCH" "(" ("0"|"1"|"ON"|"OFF") ")"
//!              | "CLOCK"  "(" number ")"
//!              | ("AND"|"NAND"|"OR"|"NOR") "(" number ")"
//!              | "XOR" | "DTYPE" | "NOT"
//! connections  = "CONNECT" "{" con { con } "}"
//! con          = point ">" point { "," point } ";"
//! point        = name [ "." name ]
//! monitors     = "MONITOR" "{" mon { mon } "}"
//! mon          = point ";"
//!
//! name         = letter { letter | digit }
//! number       = digit { digit }
//! ```
//!
//! Keywords are upper-case and reserved. Comments are delimited by `\\` on
//! both ends and may appear anywhere whitespace may. `CLOCK(p)` holds each
//! level for `p` steps; gate fan-in is limited to 16.
//!
//! # Example
//!
//! ```text
//! \\ half adder \\
//! CIRCUIT {
//!     DEVICES {
//!         a, b = SWITCH(0);
//!         sum  = XOR;
//!         cout = AND(2);
//!     }
//!     CONNECT {
//!         a > sum.I1, cout.I1;
//!         b > sum.I2, cout.I2;
//!     }
//!     MONITOR {
//!         sum;
//!         cout;
//!     }
//! } END
//! ```

mod lexer;
mod names;
mod parser;

pub use lexer::{Scanner, Token, TokenKind};
pub use names::{Keyword, NameId, NameTable};
pub use parser::parse;

use crate::circuit::Network;
use crate::error::{Diagnostics, Result, SimError};

/// Parse a definition file from disk.
pub fn parse_file(path: &std::path::Path) -> Result<(Network, Diagnostics)> {
    let source = std::fs::read_to_string(path).map_err(|e| SimError::FileRead {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(parse(&source))
}
