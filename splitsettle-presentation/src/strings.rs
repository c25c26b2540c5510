pub const NET_BALANCES_HEADER: &str = "Net Balances (positive = overpaid, negative = underpaid):";
pub const SETTLEMENT_PLAN_HEADER: &str = "Settlement Plan:";
pub const EVERYONE_SETTLED: &str = "Everyone is settled up.";
pub const SETTLEMENT_CALCULATION_FAILED: &str = "Settlement calculation failed";

pub fn total_balance(total: impl std::fmt::Display) -> String {
    format!("Total balance: ${total}. This should be zero if all transactions are balanced.")
}

pub fn imbalance_warning(total: impl std::fmt::Display) -> String {
    format!("Warning: balances are off by ${total}; check the input for mistakes.")
}

pub fn merge_header(source: &str, target: &str) -> String {
    format!("Transferring all of {source}'s money to {target}. New balances:")
}

pub fn pays(from: &str, to: &str, amount: impl std::fmt::Display) -> String {
    format!("{from} pays {to} ${amount}")
}

pub fn record_line(line: usize) -> String {
    format!("line {line}")
}
