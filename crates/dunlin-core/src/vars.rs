//! Invoice-derived template variables and their formatting.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::render::TemplateVars;
use dunlin_types::store_adapter::Invoice;

/// Build the variable map for one schedule step of an invoice.
///
/// `day_offset` is the step's offset, surfaced as `{daysOverdue}` (floored
/// at zero for steps on or before the due date). `{invoiceLink}` reuses the
/// invoice's notes field and renders blank when absent.
pub fn invoice_vars(invoice: &Invoice, day_offset: i32) -> TemplateVars {
	let mut vars = TemplateVars::new();
	vars.insert("clientName".to_string(), invoice.client_name.to_string());
	vars.insert("amount".to_string(), format_currency(invoice.amount, &invoice.currency));
	vars.insert("currency".to_string(), invoice.currency.to_string());
	vars.insert("dueDate".to_string(), format_long_date(invoice.due_date));
	vars.insert("invoiceNumber".to_string(), invoice.invoice_number.to_string());
	vars.insert("daysOverdue".to_string(), day_offset.max(0).to_string());
	vars.insert(
		"invoiceLink".to_string(),
		invoice.notes.as_deref().unwrap_or_default().to_string(),
	);
	vars
}

/// Format an amount with its currency symbol and thousands grouping.
///
/// Currencies without a known presentation fall back to `"<CODE> <amount>"`.
pub fn format_currency(amount: Decimal, currency: &str) -> String {
	let code = currency.to_ascii_uppercase();
	let Some((symbol, decimals)) = currency_style(&code) else {
		return format!("{} {}", code, amount.round_dp(2));
	};

	let rounded = amount.round_dp(u32::from(decimals));
	let sign = if rounded.is_sign_negative() { "-" } else { "" };
	let abs = rounded.abs();
	let int_digits = abs.trunc().to_string();
	let grouped = group_thousands(int_digits.split('.').next().unwrap_or("0"));

	if decimals == 0 {
		return format!("{}{}{}", sign, symbol, grouped);
	}

	let scale = Decimal::from(10u32.pow(u32::from(decimals)));
	let frac = ((abs - abs.trunc()) * scale).round().to_u64().unwrap_or(0);
	format!("{}{}{}.{:0width$}", sign, symbol, grouped, frac, width = decimals as usize)
}

/// Long-form date, e.g. "June 1, 2025".
pub fn format_long_date(date: NaiveDate) -> String {
	date.format("%B %-d, %Y").to_string()
}

fn currency_style(code: &str) -> Option<(&'static str, u8)> {
	match code {
		"USD" => Some(("$", 2)),
		"EUR" => Some(("€", 2)),
		"GBP" => Some(("£", 2)),
		"CAD" => Some(("CA$", 2)),
		"AUD" => Some(("A$", 2)),
		"NZD" => Some(("NZ$", 2)),
		"JPY" => Some(("¥", 0)),
		_ => None,
	}
}

fn group_thousands(digits: &str) -> String {
	let mut out = String::with_capacity(digits.len() + digits.len() / 3);
	for (i, ch) in digits.chars().enumerate() {
		if i > 0 && (digits.len() - i) % 3 == 0 {
			out.push(',');
		}
		out.push(ch);
	}
	out
}


// vim: ts=4
