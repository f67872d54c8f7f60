//! Terminal output helpers for the roomtab cli.
mod presenter;

pub use presenter::{
    MessageType, format_electric_breakdown, format_shares, format_totals, present_error,
    style_text,
};
