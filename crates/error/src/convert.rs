use crate::{ErrorCode, FedgateError};

impl From<std::io::Error> for FedgateError {
    fn from(err: std::io::Error) -> Self {
        FedgateError::new(ErrorCode::Internal, err.to_string())
    }
}

impl From<serde_json::Error> for FedgateError {
    fn from(err: serde_json::Error) -> Self {
        FedgateError::new(ErrorCode::SerializationFailed, err.to_string())
    }
}

/// Levenshtein-based suggestion, used to build "Did you mean ...?" hints
/// for unknown profiles and policy names.
pub fn closest_match(target: &str, options: &[String]) -> Option<String> {
    let mut best_match: Option<&str> = None;
    let mut min_distance = usize::MAX;

    for option in options {
        let distance = levenshtein(target, option);
        if distance < min_distance && distance <= 3 {
            min_distance = distance;
            best_match = Some(option.as_str());
        }
    }

    best_match.map(|s| s.to_string())
}

fn levenshtein(a: &str, b: &str) -> usize {
    let len_a = a.len();
    let len_b = b.len();
    let mut dp = vec![vec![0; len_b + 1]; len_a + 1];

    for (i, row) in dp.iter_mut().enumerate().take(len_a + 1) {
        row[0] = i;
    }
    for (j, val) in dp[0].iter_mut().enumerate().take(len_b + 1) {
        *val = j;
    }

    for i in 1..=len_a {
        for j in 1..=len_b {
            let cost = if a.chars().nth(i - 1) == b.chars().nth(j - 1) {
                0
            } else {
                1
            };
            dp[i][j] = std::cmp::min(
                std::cmp::min(dp[i - 1][j] + 1, dp[i][j - 1] + 1),
                dp[i - 1][j - 1] + cost,
            );
        }
    }

    dp[len_a][len_b]
}
