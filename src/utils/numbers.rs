use rand::Rng;

/// Order number: `ORD` + 8 uppercase hex digits.
pub fn order_number() -> String {
    format!("ORD{:08X}", rand::thread_rng().r#gen::<u32>())
}

/// Ticket number: `TK` + 10 uppercase hex digits.
pub fn ticket_number() -> String {
    let n = rand::thread_rng().gen_range(0..(1u64 << 40));
    format!("TK{:010X}", n)
}

/// Boarding pass number: `BP` + 8 uppercase hex digits.
pub fn boarding_pass_number() -> String {
    format!("BP{:08X}", rand::thread_rng().r#gen::<u32>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_upper_hex(s: &str) -> bool {
        s.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    }

    #[test]
    fn test_order_number_format() {
        let n = order_number();
        assert_eq!(n.len(), 11);
        assert!(n.starts_with("ORD"));
        assert!(is_upper_hex(&n[3..]));
    }

    #[test]
    fn test_ticket_number_format() {
        let n = ticket_number();
        assert_eq!(n.len(), 12);
        assert!(n.starts_with("TK"));
        assert!(is_upper_hex(&n[2..]));
    }

    #[test]
    fn test_boarding_pass_number_format() {
        let n = boarding_pass_number();
        assert_eq!(n.len(), 10);
        assert!(n.starts_with("BP"));
        assert!(is_upper_hex(&n[2..]));
    }
}
