use clap::Subcommand;

use riskportal_core::review::MAX_SCORE;
use riskportal_core::{Config, QuestionId, ReviewGateway, ScoreSheet};

use super::{gateway, CmdResult, Overrides};

#[derive(Subcommand)]
pub enum ReviewAction {
    /// List submissions waiting for review
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the questions of a submission that need a score
    Show {
        submission_id: i64,
    },
    /// Record scores and save them: --score ID=SCORE[:comment] (repeatable)
    Score {
        submission_id: i64,
        #[arg(long = "score", value_name = "ID=SCORE[:COMMENT]", required = true)]
        scores: Vec<String>,
    },
    /// Complete the review and print the calculated risk score
    Complete {
        submission_id: i64,
    },
}

pub async fn run(action: ReviewAction, config: &Config, overrides: &Overrides) -> CmdResult {
    let gateway = gateway(config, overrides)?;
    match action {
        ReviewAction::List { json } => {
            let pending = gateway.pending_reviews().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&pending)?);
            } else if pending.is_empty() {
                println!("No submissions waiting for review.");
            } else {
                for review in pending {
                    println!("{:>6}  {:<32} {}", review.id, review.vendor_name, review.status);
                }
            }
        }
        ReviewAction::Show { submission_id } => {
            let sheet = load(&gateway, submission_id).await?;
            println!(
                "Submission {} ({})",
                sheet.submission_id(),
                sheet.vendor_name().unwrap_or("unknown vendor")
            );
            let mut section = "";
            for question in sheet.questions() {
                if question.section != section {
                    section = &question.section;
                    println!("\n-- {section} --");
                }
                println!("  [{}] {} ({})", question.id, question.text, question.question_type.label());
                println!("        answer: {}", question.response.as_deref().unwrap_or("(none)"));
                match sheet.score(&question.id) {
                    Some(score) => println!(
                        "        score:  {}/{MAX_SCORE}{}",
                        score.value,
                        score.comment.as_deref().map(|c| format!(" ({c})")).unwrap_or_default()
                    ),
                    None => println!("        score:  -"),
                }
            }
        }
        ReviewAction::Score { submission_id, scores } => {
            let mut sheet = load(&gateway, submission_id).await?;
            for entry in &scores {
                let (id, value, comment) = parse_score(entry)?;
                sheet.set_score(id, value, comment)?;
            }
            sheet.save(&gateway).await?;
            println!("saved {} score(s)", scores.len());
        }
        ReviewAction::Complete { submission_id } => {
            let sheet = load(&gateway, submission_id).await?;
            match sheet.complete(&gateway).await? {
                Some(calc) => println!(
                    "Final risk score: {} (confidence interval {} - {})",
                    calc.final_score, calc.confidence_interval.low, calc.confidence_interval.high
                ),
                None => println!("Review completed."),
            }
        }
    }
    Ok(())
}

async fn load<G: ReviewGateway>(gateway: &G, submission_id: i64) -> Result<ScoreSheet, Box<dyn std::error::Error>> {
    let detail = gateway.fetch_submission(submission_id).await?;
    Ok(ScoreSheet::from_submission(submission_id, &detail))
}

/// Parse `ID=SCORE` or `ID=SCORE:comment`.
fn parse_score(entry: &str) -> Result<(QuestionId, f64, Option<&str>), String> {
    let (id, rest) = entry
        .split_once('=')
        .ok_or_else(|| format!("expected ID=SCORE[:comment], got '{entry}'"))?;
    let (value, comment) = match rest.split_once(':') {
        Some((value, comment)) => (value, Some(comment)),
        None => (rest, None),
    };
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing question id in '{entry}'"));
    }
    let id = QuestionId::from(id);
    let value = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid score '{value}'"))?;
    Ok((id, value, comment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_with_comment() {
        assert_eq!(
            parse_score("7=8.5:weak MFA story"),
            Ok((QuestionId::from(7), 8.5, Some("weak MFA story")))
        );
    }

    #[test]
    fn score_without_comment() {
        assert_eq!(parse_score("3=10"), Ok((QuestionId::from(3), 10.0, None)));
    }

    #[test]
    fn string_question_ids_are_kept() {
        assert_eq!(
            parse_score("q-7=4"),
            Ok((QuestionId::Key("q-7".into()), 4.0, None))
        );
    }

    #[test]
    fn malformed_scores_are_rejected() {
        assert!(parse_score("3").is_err());
        assert!(parse_score(" =1").is_err());
        assert!(parse_score("3=high").is_err());
    }
}
