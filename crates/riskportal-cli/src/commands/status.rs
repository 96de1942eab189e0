use riskportal_core::{Config, QuestionnaireKind, SubmissionGateway};

use super::{gateway, CmdResult, Overrides};

pub async fn run(json: bool, config: &Config, overrides: &Overrides) -> CmdResult {
    let gateway = gateway(config, overrides)?;
    let status = gateway.vendor_status().await?;

    if json {
        let value = serde_json::json!({
            "assessment_status": status,
            "current_step": status.current_step(),
            "next": status.next_questionnaire(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for kind in QuestionnaireKind::ALL {
        let marker = if !status.is_unlocked(kind) {
            "locked"
        } else if status.status(kind).is_finished() {
            "read-only"
        } else {
            "open"
        };
        println!("{:<26} {:<12} ({marker})", kind.title(), status.status(kind).to_string());
    }
    match status.next_questionnaire() {
        Some(next) => println!("\nNext: {} (riskportal questionnaire fill {})", next.title(), next),
        None => println!("\nAll questionnaires complete."),
    }
    Ok(())
}
