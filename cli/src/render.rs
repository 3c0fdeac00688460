//! Plain-text rendering of admin state for the console.

use reclaim_admin::{SessionSnapshot, SyncOutcome, VerificationOutcome};
use reclaim_types::Report;
use std::fmt::Write;

pub fn session(s: &SessionSnapshot) -> String {
    match s.address() {
        None => "wallet: not connected".to_string(),
        Some(address) if s.is_authorized() => format!("wallet: {address} (administrator)"),
        Some(address) => format!("wallet: {address} (not authorized to view reports)"),
    }
}

pub fn report(r: &Report) -> String {
    let mut out = format!("Case #{} [{}]", r.id, r.status_label());
    if !r.description.is_empty() {
        let _ = write!(out, "\n  {}", r.description);
    }
    if !r.location.is_empty() {
        let _ = write!(out, "\n  location: {}", r.location);
    }
    if let Some(link) = &r.evidence_link {
        let _ = write!(out, "\n  evidence: {link}");
    }
    if let Some(ts) = r.timestamp {
        let _ = write!(out, "\n  submitted: {}", ts.format("%Y-%m-%d %H:%M UTC"));
    }
    if r.verified {
        let _ = write!(out, "\n  reward: {}", r.reward);
    }
    out
}

pub fn reports(list: &[Report]) -> String {
    if list.is_empty() {
        return "no reports".to_string();
    }
    list.iter().map(report).collect::<Vec<_>>().join("\n")
}

pub fn sync(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Replaced { count } => format!("loaded {count} report(s)"),
        SyncOutcome::Cleared => "report list cleared".to_string(),
        SyncOutcome::Discarded => "report list changed session; listing discarded".to_string(),
    }
}

pub fn verification(outcome: &VerificationOutcome) -> String {
    match outcome {
        VerificationOutcome::Confirmed {
            report_id,
            tx_hash,
            block_number,
            refreshed,
        } => {
            let mut out = format!(
                "Report #{report_id} verified successfully (tx {tx_hash}, block {block_number})."
            );
            if !refreshed {
                out.push_str(" Report list not refreshed.");
            }
            out
        }
        VerificationOutcome::Abandoned { report_id, tx_hash } => format!(
            "Stopped waiting for case #{report_id} (tx {tx_hash}); the transaction may still be included."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclaim_types::{ReportId, TxHash, Wei};

    #[test]
    fn pending_report_omits_reward() {
        let r = Report {
            description: "Needs help".into(),
            location: "Lagos".into(),
            ..Report::pending(3)
        };
        let text = report(&r);
        assert!(text.starts_with("Case #3 [Pending Review]"));
        assert!(text.contains("location: Lagos"));
        assert!(!text.contains("reward"));
    }

    #[test]
    fn verified_report_shows_reward() {
        let r = Report {
            verified: true,
            reward: Wei::new(500_000_000_000_000_000),
            ..Report::pending(2)
        };
        assert!(report(&r).contains("reward: 0.5 ETH"));
    }

    #[test]
    fn empty_listing() {
        assert_eq!(reports(&[]), "no reports");
    }

    #[test]
    fn abandoned_outcome_mentions_tx() {
        let text = verification(&VerificationOutcome::Abandoned {
            report_id: ReportId::new(4),
            tx_hash: TxHash::ZERO,
        });
        assert!(text.contains("#4"));
        assert!(text.contains("0x00"));
    }
}
