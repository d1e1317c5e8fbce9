//! Queue-class derivation from requested runtime.

/// Bucket a runtime request into a scheduling tier.
///
/// Up to 12 hours runs short, up to 5 days runs medium, everything else
/// runs long. The bucketing is pure: it is replayed verbatim when a
/// timeout-driven resubmission recomputes the class.
pub fn bucket_runtime(runtime_minutes: u64) -> &'static str {
    if runtime_minutes <= 720 {
        "short"
    } else if runtime_minutes <= 7200 {
        "medium"
    } else {
        "long"
    }
}

/// Queue class for a fresh submission.
///
/// An explicit class wins verbatim regardless of runtime (the escape hatch
/// for priority tiers); otherwise the runtime is bucketed.
pub fn queue_class(runtime_minutes: u64, explicit: Option<&str>) -> String {
    match explicit {
        Some(class) => class.to_string(),
        None => bucket_runtime(runtime_minutes).to_string(),
    }
}

/// Queue class after a timeout-driven runtime extension.
///
/// A class the bucketing produced is recomputed from the new runtime; any
/// other class was an operator override and survives as-is.
pub fn rebucket(runtime_minutes: u64, current: &str) -> String {
    match current {
        "short" | "medium" | "long" => bucket_runtime(runtime_minutes).to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(bucket_runtime(1), "short");
        assert_eq!(bucket_runtime(720), "short");
        assert_eq!(bucket_runtime(721), "medium");
        assert_eq!(bucket_runtime(7200), "medium");
        assert_eq!(bucket_runtime(7201), "long");
    }

    #[test]
    fn test_explicit_class_always_wins() {
        assert_eq!(queue_class(10, Some("priority")), "priority");
        assert_eq!(queue_class(100_000, Some("priority")), "priority");
        assert_eq!(queue_class(10, Some("long")), "long");
    }

    #[test]
    fn test_derived_class_follows_bucketing() {
        assert_eq!(queue_class(720, None), "short");
        assert_eq!(queue_class(1000, None), "medium");
        assert_eq!(queue_class(10_000, None), "long");
    }

    #[test]
    fn test_rebucket_recomputes_standard_tiers() {
        // 600 -> 900 minutes crosses the short/medium boundary.
        assert_eq!(rebucket(900, "short"), "medium");
        assert_eq!(rebucket(1500, "medium"), "medium");
        assert_eq!(rebucket(8000, "medium"), "long");
    }

    #[test]
    fn test_rebucket_preserves_overrides() {
        assert_eq!(rebucket(10_000, "priority"), "priority");
        assert_eq!(rebucket(50, "gpu_high"), "gpu_high");
    }
}
