// Display formatting for rand amounts and shares

/// Whole-rand amount with thousands separators: 1234567.6 → "R1,234,568"
pub fn format_rand(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}R{}", sign, grouped)
}

/// One-decimal percentage; anything under 0.1% shows as "0.0%"
pub fn format_share(share: f64) -> String {
    if !share.is_finite() || share < 0.001 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", share * 100.0)
}

/// Two-decimal percentage used on the proportion charts
pub fn format_share_precise(share: f64) -> String {
    if !share.is_finite() {
        return "0.00%".to_string();
    }
    format!("{:.2}%", share * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rand() {
        assert_eq!(format_rand(0.0), "R0");
        assert_eq!(format_rand(10.0), "R10");
        assert_eq!(format_rand(999.0), "R999");
        assert_eq!(format_rand(1000.0), "R1,000");
        assert_eq!(format_rand(1015.0), "R1,015");
        assert_eq!(format_rand(1_234_567.6), "R1,234,568");
        assert_eq!(format_rand(100_000.0), "R100,000");
        assert_eq!(format_rand(-2500.0), "-R2,500");
    }

    #[test]
    fn test_format_share() {
        assert_eq!(format_share(1000.0 / 1015.0), "98.5%");
        assert_eq!(format_share(0.05), "5.0%");
        assert_eq!(format_share(1.0), "100.0%");
        assert_eq!(format_share(0.0009), "0.0%");
        assert_eq!(format_share(0.0), "0.0%");
        assert_eq!(format_share(f64::NAN), "0.0%");
    }

    #[test]
    fn test_format_share_precise() {
        assert_eq!(format_share_precise(0.25), "25.00%");
        assert_eq!(format_share_precise(1.0 / 3.0), "33.33%");
    }
}
