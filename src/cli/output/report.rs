use crate::utils::percentage::{seconds_share, Percentage};

#[derive(Debug, PartialEq)]
pub struct DomainUsage {
    pub domain: String,
    pub seconds: f64,
}

/// Returns domains sorted by accumulated time plus the tracked total.
/// Domains below the percentage threshold are dropped to keep the report
/// readable.
pub fn analyze_domains(
    durations: Vec<(String, f64)>,
    min_percentage: Percentage,
) -> (Vec<DomainUsage>, f64) {
    let total: f64 = durations.iter().map(|(_, seconds)| seconds).sum();
    let threshold = total * *min_percentage / 100.;

    let mut usages = durations
        .into_iter()
        .filter(|(_, seconds)| *seconds >= threshold)
        .map(|(domain, seconds)| DomainUsage { domain, seconds })
        .collect::<Vec<_>>();
    usages.sort_by(|a, b| {
        b.seconds
            .partial_cmp(&a.seconds)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    (usages, total)
}

pub fn format_seconds(seconds: f64) -> String {
    let seconds = seconds.round() as i64;
    let (hours, minutes, seconds) = (seconds / 3600, seconds % 3600 / 60, seconds % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

pub fn print_report(usages: &[DomainUsage], total: f64) {
    if usages.is_empty() {
        println!("Nothing tracked yet");
        return;
    }
    println!("Tracked {} in total", format_seconds(total));
    for usage in usages {
        println!(
            "{:>10}  {:>6.1}%  {}",
            format_seconds(usage.seconds),
            *seconds_share(usage.seconds, total),
            usage.domain
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::percentage::Percentage;

    use super::{analyze_domains, format_seconds};

    #[test]
    fn test_analyze_sorts_descending_and_filters() {
        let durations = vec![
            ("github.com".to_string(), 600.),
            ("example.org".to_string(), 5.),
            ("youtube.com".to_string(), 395.),
        ];

        let (usages, total) = analyze_domains(durations, Percentage::new_opt(1.).unwrap());

        assert_eq!(total, 1000.);
        assert_eq!(
            usages
                .iter()
                .map(|usage| usage.domain.as_str())
                .collect::<Vec<_>>(),
            ["github.com", "youtube.com"]
        );
    }

    #[test]
    fn test_zero_threshold_keeps_everything() {
        let durations = vec![("a.example".to_string(), 1.), ("b.example".to_string(), 2.)];

        let (usages, _) = analyze_domains(durations, Percentage::new_opt(0.).unwrap());
        assert_eq!(usages.len(), 2);
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(42.), "42s");
        assert_eq!(format_seconds(90.), "1m 30s");
        assert_eq!(format_seconds(3723.), "1h 2m 3s");
    }
}
