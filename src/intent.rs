/// A decoded callback payload. Handlers parse the raw string once at the
/// transport boundary and dispatch on this instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Intent {
    Toggle(usize),
    Confirm,
    Details,
    Restart,
}

impl Intent {
    pub(crate) fn parse(data: &str) -> Option<Self> {
        if let Some(index) = data.strip_prefix("opt_") {
            return index.parse().ok().map(Intent::Toggle);
        }

        match data {
            "confirm" => Some(Intent::Confirm),
            "details" => Some(Intent::Details),
            "restart" => Some(Intent::Restart),
            _ => None,
        }
    }

    pub(crate) fn data(&self) -> String {
        match self {
            Intent::Toggle(index) => format!("opt_{index}"),
            Intent::Confirm => "confirm".into(),
            Intent::Details => "details".into(),
            Intent::Restart => "restart".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Intent;

    #[test]
    fn parses_known_payloads() {
        assert_eq!(Intent::parse("opt_0"), Some(Intent::Toggle(0)));
        assert_eq!(Intent::parse("opt_12"), Some(Intent::Toggle(12)));
        assert_eq!(Intent::parse("confirm"), Some(Intent::Confirm));
        assert_eq!(Intent::parse("details"), Some(Intent::Details));
        assert_eq!(Intent::parse("restart"), Some(Intent::Restart));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Intent::parse(""), None);
        assert_eq!(Intent::parse("opt_"), None);
        assert_eq!(Intent::parse("opt_x"), None);
        assert_eq!(Intent::parse("opt_-1"), None);
        assert_eq!(Intent::parse("Confirm"), None);
    }

    #[test]
    fn data_round_trips() {
        for intent in [
            Intent::Toggle(3),
            Intent::Confirm,
            Intent::Details,
            Intent::Restart,
        ] {
            assert_eq!(Intent::parse(&intent.data()), Some(intent));
        }
    }
}
