//! Address-family filtering of probes.

use crate::atlas::Probe;

/// Address-family requirement for selected probes.
///
/// The four variants partition the probe population exactly: a probe with
/// both families is never a `V4Only` match, and `Nothing` matches no probe at
/// all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyFilter {
    /// IPv4 address present, IPv6 address empty
    V4Only,
    /// IPv6 address present, IPv4 address empty
    V6Only,
    /// Both addresses present
    DualStack,
    /// Neither family requested; selects nothing
    Nothing,
}

impl FamilyFilter {
    pub fn from_flags(want_v4: bool, want_v6: bool) -> Self {
        match (want_v4, want_v6) {
            (true, false) => FamilyFilter::V4Only,
            (false, true) => FamilyFilter::V6Only,
            (true, true) => FamilyFilter::DualStack,
            (false, false) => FamilyFilter::Nothing,
        }
    }

    pub fn matches(&self, probe: &Probe) -> bool {
        match self {
            FamilyFilter::V4Only => probe.has_v4() && !probe.has_v6(),
            FamilyFilter::V6Only => probe.has_v6() && !probe.has_v4(),
            FamilyFilter::DualStack => probe.has_v4() && probe.has_v6(),
            FamilyFilter::Nothing => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn probe(v4: Option<&str>, v6: Option<&str>) -> Probe {
        serde_json::from_value(json!({
            "id": 1,
            "address_v4": v4,
            "address_v6": v6,
            "status": {"id": 1, "name": "Connected"},
            "is_public": true
        }))
        .unwrap()
    }

    #[test]
    fn test_filters_partition_probes() {
        let v4 = probe(Some("192.0.2.1"), None);
        let v6 = probe(None, Some("2001:db8::1"));
        let dual = probe(Some("192.0.2.1"), Some("2001:db8::1"));
        let none = probe(Some(""), None);

        let cases = [
            (FamilyFilter::V4Only, [true, false, false, false]),
            (FamilyFilter::V6Only, [false, true, false, false]),
            (FamilyFilter::DualStack, [false, false, true, false]),
            (FamilyFilter::Nothing, [false, false, false, false]),
        ];
        for (filter, expected) in cases {
            let got = [&v4, &v6, &dual, &none].map(|p| filter.matches(p));
            assert_eq!(got, expected, "{:?}", filter);
        }
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(FamilyFilter::from_flags(true, false), FamilyFilter::V4Only);
        assert_eq!(FamilyFilter::from_flags(false, true), FamilyFilter::V6Only);
        assert_eq!(FamilyFilter::from_flags(true, true), FamilyFilter::DualStack);
        assert_eq!(FamilyFilter::from_flags(false, false), FamilyFilter::Nothing);
    }
}
