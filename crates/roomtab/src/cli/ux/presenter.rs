use console::{Style, StyledObject};
use roomtab_core::account::{PersonalAccount, PublicAccount};
use roomtab_core::split::{ElectricOutcome, Share};

/// Represents the type of a terminal message, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// The prompt for user input.
    Prompt,
    /// Status information, like the tracked-user line.
    Footer,
    /// An error message.
    Error,
}

/// Styles a string of text according to the specified `MessageType`.
pub fn style_text(text: &str, style: MessageType) -> StyledObject<&str> {
    let style_obj = match style {
        MessageType::Prompt => Style::new().blue().bold(),
        MessageType::Footer => Style::new().white().dim(),
        MessageType::Error => Style::new().red().bold(),
    };
    style_obj.apply_to(text)
}

pub fn present_error(err: &anyhow::Error) {
    eprintln!(
        "{}",
        style_text(&format!("Error: {err:#}"), MessageType::Error)
    );
}

/// Renders each tracked user's share of a uniform bill.
pub fn format_shares(label: &str, shares: &[Share]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Everyone's {label} fee:\n"));
    for share in shares {
        out.push_str(&format!("\t{} owes: {:.2}\n", share.name, share.amount));
    }
    out
}

/// Renders the calculation breakdown of an applied electricity bill.
pub fn format_electric_breakdown(outcome: &ElectricOutcome, unit_price: f64) -> String {
    let mut out = String::new();
    out.push_str("Electricity breakdown:\n");
    for share in &outcome.shares {
        out.push_str(&format!(
            "\t{} metered: ({:.2} - {:.2}) * {:.2} = {:.2}\n",
            share.name, share.current_read, share.last_read, unit_price, share.personal_fee
        ));
    }
    out.push_str(&format!(
        "\tshared remainder: {:.2} kWh * {:.2} = {:.2}\n",
        outcome.remainder_kwh, unit_price, outcome.public_fee
    ));
    for share in &outcome.shares {
        out.push_str(&format!(
            "\t{} owes: {:.2} + {:.2} = {:.2}\n",
            share.name, share.personal_fee, share.shared_fee, share.total_fee
        ));
    }
    out
}

/// Renders current totals for the tracked users and the public account.
pub fn format_totals(users: &[(String, &PersonalAccount)], public: &PublicAccount) -> String {
    let mut out = String::new();
    out.push_str("Current fees:\n");
    for (name, account) in users {
        out.push_str(&format!("\t{name}:\n"));
        out.push_str(&format!(
            "\t\telectricity: {:.2}\n",
            account.total_electric_fee
        ));
        out.push_str(&format!("\t\twater: {:.2}\n", account.water_fee));
        out.push_str(&format!("\t\tgas: {:.2}\n", account.gas_fee));
        out.push_str(&format!("\t\tnetwork: {:.2}\n", account.network_fee));
        out.push_str(&format!("\t\ttotal: {:.2}\n\n", account.total_fee));
    }
    out.push_str("\tPUBLIC:\n");
    out.push_str(&format!(
        "\t\telectricity total: {:.2}\n",
        public.public_electric_fee
    ));
    out.push_str(&format!("\t\twater total: {:.2}\n", public.water_fee));
    out.push_str(&format!("\t\tgas total: {:.2}\n", public.gas_fee));
    out.push_str(&format!("\t\tnetwork total: {:.2}\n", public.network_fee));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomtab_core::split::ElectricShare;

    #[test]
    fn test_message_styles() {
        let styled = style_text("test", MessageType::Error);
        assert_eq!(
            styled.force_styling(true).to_string(),
            "\u{1b}[31m\u{1b}[1mtest\u{1b}[0m"
        );
    }

    #[test]
    fn test_format_shares() {
        let shares = vec![
            Share {
                name: "ALICE".to_string(),
                amount: 50.0,
            },
            Share {
                name: "BOB".to_string(),
                amount: 0.0,
            },
        ];
        let out = format_shares("water", &shares);
        assert!(out.contains("Everyone's water fee:"));
        assert!(out.contains("ALICE owes: 50.00"));
        assert!(out.contains("BOB owes: 0.00"));
    }

    #[test]
    fn test_format_electric_breakdown() {
        let outcome = ElectricOutcome {
            shares: vec![ElectricShare {
                name: "ALICE".to_string(),
                current_read: 120.0,
                last_read: 100.0,
                personal_fee: 40.0,
                shared_fee: 10.0,
                total_fee: 50.0,
            }],
            remainder_kwh: 5.0,
            public_fee: 10.0,
        };
        let out = format_electric_breakdown(&outcome, 2.0);
        assert!(out.contains("ALICE metered: (120.00 - 100.00) * 2.00 = 40.00"));
        assert!(out.contains("shared remainder: 5.00 kWh * 2.00 = 10.00"));
        assert!(out.contains("ALICE owes: 40.00 + 10.00 = 50.00"));
    }

    #[test]
    fn test_format_totals() {
        let account = PersonalAccount {
            total_electric_fee: 90.0,
            water_fee: 100.0,
            total_fee: 190.0,
            ..Default::default()
        };
        let public = PublicAccount {
            water_fee: 300.0,
            ..Default::default()
        };
        let users = vec![("ALICE".to_string(), &account)];

        let out = format_totals(&users, &public);
        assert!(out.contains("ALICE:"));
        assert!(out.contains("electricity: 90.00"));
        assert!(out.contains("water: 100.00"));
        assert!(out.contains("total: 190.00"));
        assert!(out.contains("PUBLIC:"));
        assert!(out.contains("water total: 300.00"));
    }
}
