use clap::Subcommand;
use dialoguer::theme::ColorfulTheme;
use std::path::{Path, PathBuf};

use riskportal_core::error::UploadError;
use riskportal_core::questionnaire::{
    Prompter, QuestionEntry, ReturnOutcome, SubmitOutcome, UnsavedChoice, UploadPhase,
};
use riskportal_core::{
    Answer, Config, HttpGateway, Question, QuestionId, QuestionType, QuestionnaireKind,
    SubmissionGateway, WizardController, WizardError,
};

use super::io::{confirm_action, prompt_text, select};
use super::{gateway, CmdResult, Overrides};

#[derive(Subcommand)]
pub enum QuestionnaireAction {
    /// Print a questionnaire with its current answers
    Show {
        /// corporate, contextual or risk-assessment
        kind: QuestionnaireKind,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fill in a questionnaire interactively, section by section
    Fill {
        kind: QuestionnaireKind,
    },
    /// Set answers without the wizard and save them
    Answer {
        kind: QuestionnaireKind,
        /// QUESTION_ID=VALUE; yes/no, a choice id or text, or free text
        #[arg(long = "set", value_name = "ID=VALUE", required = true)]
        set: Vec<String>,
    },
    /// Upload a document for a risk-assessment file question
    Upload {
        question_id: QuestionId,
        path: PathBuf,
    },
    /// Remove the document uploaded for a risk-assessment file question
    RemoveUpload {
        question_id: QuestionId,
    },
    /// Validate every section and submit
    Submit {
        kind: QuestionnaireKind,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

pub async fn run(action: QuestionnaireAction, config: &Config, overrides: &Overrides) -> CmdResult {
    let gateway = gateway(config, overrides)?;
    match action {
        QuestionnaireAction::Show { kind, json } => {
            let wizard = load(&gateway, kind, config).await?;
            if json {
                let value = serde_json::json!({
                    "kind": wizard.kind(),
                    "questionnaire_id": wizard.questionnaire_id(),
                    "layout": wizard.layout(),
                    "answers": wizard.store().get_all(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                print_all(&wizard);
            }
        }
        QuestionnaireAction::Fill { kind } => {
            ensure_editable(&gateway, kind).await?;
            let mut wizard = load(&gateway, kind, config).await?;
            fill(&gateway, &mut wizard).await?;
        }
        QuestionnaireAction::Answer { kind, set } => {
            ensure_editable(&gateway, kind).await?;
            let mut wizard = load(&gateway, kind, config).await?;
            for assignment in &set {
                let (id, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| format!("expected ID=VALUE, got '{assignment}'"))?;
                let id = QuestionId::from(id.trim());
                let question = wizard
                    .layout()
                    .question(&id)
                    .ok_or_else(|| WizardError::UnknownQuestion(id.clone()))?;
                let answer = parse_answer(question, value)?;
                wizard.answer(id, answer)?;
            }
            wizard.save(&gateway).await?;
            println!("saved {} answer(s)", set.len());
        }
        QuestionnaireAction::Upload { question_id, path } => {
            let kind = QuestionnaireKind::RiskAssessment;
            ensure_editable(&gateway, kind).await?;
            let mut wizard = load(&gateway, kind, config).await?;
            upload(&gateway, &mut wizard, &question_id, &path).await?;
            wizard.save(&gateway).await?;
        }
        QuestionnaireAction::RemoveUpload { question_id } => {
            let kind = QuestionnaireKind::RiskAssessment;
            ensure_editable(&gateway, kind).await?;
            let mut wizard = load(&gateway, kind, config).await?;
            match wizard.remove_upload(question_id)? {
                Some(file) => println!("removed {}", file.file_name),
                None => println!("upload cancelled"),
            }
            wizard.save(&gateway).await?;
        }
        QuestionnaireAction::Submit { kind, yes } => {
            ensure_editable(&gateway, kind).await?;
            let mut wizard = load(&gateway, kind, config).await?;
            if let Err(e) = wizard.check_complete() {
                report(&e);
                return Err(e.into());
            }
            while !wizard.is_last_section() {
                wizard.next()?;
            }
            let outcome = if yes {
                wizard.submit(&gateway, &AutoConfirm).await
            } else {
                wizard.submit(&gateway, &TermPrompter::default()).await
            };
            match outcome {
                Ok(SubmitOutcome::Submitted) => println!("{} submitted", kind.title()),
                Ok(SubmitOutcome::Declined) => println!("submission cancelled"),
                Err(e) => {
                    report(&e);
                    return Err(e.into());
                }
            }
        }
    }
    Ok(())
}

async fn load(
    gateway: &HttpGateway,
    kind: QuestionnaireKind,
    config: &Config,
) -> Result<WizardController, WizardError> {
    Ok(WizardController::load(gateway, kind)
        .await?
        .with_max_upload_mb(config.upload.max_file_mb))
}

/// Refuse locked or already submitted questionnaires before editing.
async fn ensure_editable(gateway: &HttpGateway, kind: QuestionnaireKind) -> CmdResult {
    let status = gateway.vendor_status().await?;
    if !status.is_unlocked(kind) {
        return Err(format!("{} is locked until the previous questionnaire is submitted", kind.title()).into());
    }
    if status.status(kind).is_finished() {
        return Err(format!("{} is {} and can no longer be modified", kind.title(), status.status(kind)).into());
    }
    Ok(())
}

async fn upload(
    gateway: &HttpGateway,
    wizard: &mut WizardController,
    question_id: &QuestionId,
    path: &Path,
) -> CmdResult {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| format!("{} is not a file", path.display()))?;
    wizard
        .upload_file(gateway, question_id, &file_name, bytes)
        .await?;
    println!("uploaded {file_name}");
    Ok(())
}

/// Interpret user input for a non-file question.
fn parse_answer(question: &Question, input: &str) -> Result<Answer, String> {
    let input = input.trim();
    match question.question_type {
        QuestionType::YesNo => match input.to_ascii_lowercase().as_str() {
            "y" | "yes" | "true" => Ok(Answer::YesNo(true)),
            "n" | "no" | "false" => Ok(Answer::YesNo(false)),
            _ => Err(format!("answer yes or no, got '{input}'")),
        },
        QuestionType::MultipleChoice => {
            let by_id = input
                .parse::<i64>()
                .ok()
                .and_then(|id| question.choice(id));
            let by_text = || {
                question
                    .choices
                    .iter()
                    .find(|c| c.text.eq_ignore_ascii_case(input))
            };
            by_id
                .or_else(by_text)
                .map(|c| Answer::Choice(c.id))
                .ok_or_else(|| format!("'{input}' is not one of the listed choices"))
        }
        QuestionType::ShortAnswer => Ok(Answer::Text(input.to_string())),
        QuestionType::FileUpload => Err("file questions take a path to upload".to_string()),
    }
}

fn describe(wizard: &WizardController, question: &Question) -> String {
    if question.question_type == QuestionType::FileUpload {
        let state = wizard.uploads().state(&question.id);
        return match state.phase {
            UploadPhase::Idle => "(no file)".to_string(),
            UploadPhase::Uploading => format!("uploading {}%", state.progress_percent),
            UploadPhase::Done => state.file_name.unwrap_or_default(),
            UploadPhase::Failed => format!("failed: {}", state.error.unwrap_or_default()),
        };
    }
    match wizard.store().get(&question.id) {
        None => "(unanswered)".to_string(),
        Some(Answer::YesNo(true)) => "Yes".to_string(),
        Some(Answer::YesNo(false)) => "No".to_string(),
        Some(Answer::Choice(id)) => question
            .choice(*id)
            .map_or_else(|| format!("choice {id}"), |c| c.text.clone()),
        Some(Answer::Text(text)) => format!("\"{text}\""),
        Some(Answer::File(file)) => file.file_name.clone(),
    }
}

fn print_entry(wizard: &WizardController, entry: &QuestionEntry) {
    match entry {
        QuestionEntry::Supported(q) => {
            println!("  [{}] {} ({})", q.id, q.text, q.question_type.label());
            for choice in &q.choices {
                println!("        {:>4}: {}", choice.id, choice.text);
            }
            println!("        -> {}", describe(wizard, q));
        }
        QuestionEntry::Unsupported(u) => {
            println!("  [{}] {} (unsupported: {})", u.id, u.text, u.reason);
        }
    }
}

fn print_section(wizard: &WizardController) {
    let Some(section) = wizard.current_section() else {
        return;
    };
    println!(
        "\n== {} :: {} ({}) [{}%] ==",
        wizard.kind().title(),
        section.name,
        wizard.position(),
        wizard.progress_percent()
    );
    for entry in &section.entries {
        print_entry(wizard, entry);
    }
}

fn print_all(wizard: &WizardController) {
    println!("{}", wizard.kind().title());
    for section in wizard.layout().sections() {
        println!("\n-- {} --", section.name);
        for entry in &section.entries {
            print_entry(wizard, entry);
        }
    }
}

/// Print per-question details for validation errors.
fn report(err: &WizardError) {
    let failures = match err {
        WizardError::ValidationFailed { failures } => failures,
        WizardError::IncompleteSubmission { failures, .. } => failures,
        _ => return,
    };
    for failure in failures {
        eprintln!("  - [{}] {}", failure.question_id, failure);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Next,
    Submit,
    Previous,
    Save,
    EditAgain,
    Quit,
}

impl MenuAction {
    fn label(self) -> &'static str {
        match self {
            MenuAction::Next => "Next section",
            MenuAction::Submit => "Submit",
            MenuAction::Previous => "Previous section",
            MenuAction::Save => "Save progress",
            MenuAction::EditAgain => "Edit this section again",
            MenuAction::Quit => "Return to dashboard",
        }
    }

    /// Entries offered after a section; Submit replaces Next on the last one.
    fn menu(last: bool) -> [MenuAction; 5] {
        let forward = if last { MenuAction::Submit } else { MenuAction::Next };
        [
            forward,
            MenuAction::Previous,
            MenuAction::Save,
            MenuAction::EditAgain,
            MenuAction::Quit,
        ]
    }
}

async fn fill(gateway: &HttpGateway, wizard: &mut WizardController) -> CmdResult {
    let prompter = TermPrompter::default();
    let theme = &prompter.theme;
    loop {
        print_section(wizard);
        let questions: Vec<Question> = wizard
            .current_section()
            .map(|s| s.questions().cloned().collect())
            .unwrap_or_default();

        for question in &questions {
            if let Err(e) = edit_question(theme, gateway, wizard, question).await {
                return input_closed(wizard, e);
            }
        }

        let actions = MenuAction::menu(wizard.is_last_section());
        let labels: Vec<String> = actions.iter().map(|a| a.label().to_string()).collect();
        let action = match select(theme, "What next?", &labels, 0) {
            Ok(Some(index)) => actions[index],
            Ok(None) => MenuAction::Quit,
            Err(e) => return input_closed(wizard, e),
        };

        let result = match action {
            MenuAction::Next => wizard.next(),
            MenuAction::Submit => match wizard.submit(gateway, &prompter).await {
                Ok(SubmitOutcome::Submitted) => {
                    println!("{} submitted", wizard.kind().title());
                    return Ok(());
                }
                Ok(SubmitOutcome::Declined) => Ok(()),
                Err(e) => Err(e),
            },
            MenuAction::Previous => wizard.previous(),
            MenuAction::Save => wizard.save(gateway).await.map(|()| println!("saved")),
            MenuAction::EditAgain => Ok(()),
            MenuAction::Quit => match wizard.return_to_dashboard(gateway, &prompter).await {
                Ok(ReturnOutcome::Left { .. }) => return Ok(()),
                Ok(ReturnOutcome::Stayed) => Ok(()),
                Err(e) => Err(e),
            },
        };
        if let Err(e) = result {
            eprintln!("error: {e}");
            report(&e);
        }
    }
}

fn input_closed(wizard: &WizardController, err: dialoguer::Error) -> CmdResult {
    tracing::debug!(error = %err, "terminal input unavailable");
    if wizard.is_dirty() {
        eprintln!("input closed; unsaved changes discarded");
    }
    Ok(())
}

/// Prompt for one question until the input is accepted or kept.
async fn edit_question(
    theme: &ColorfulTheme,
    gateway: &HttpGateway,
    wizard: &mut WizardController,
    question: &Question,
) -> Result<(), dialoguer::Error> {
    loop {
        let current = describe(wizard, question);
        let answer = match question.question_type {
            QuestionType::FileUpload => {
                let input = prompt_text(
                    theme,
                    &format!("{} [{current}] file path (empty keeps, '-' removes)", question.text),
                )?;
                let result = match input.trim() {
                    "" => return Ok(()),
                    "-" => match wizard.remove_upload(&question.id) {
                        Ok(_) | Err(WizardError::Upload(UploadError::NoActiveUpload(_))) => Ok(()),
                        Err(e) => Err(e.into()),
                    },
                    path => upload(gateway, wizard, &question.id, Path::new(path)).await,
                };
                match result {
                    Ok(()) => return Ok(()),
                    Err(e) => eprintln!("error: {e}"),
                }
                continue;
            }
            QuestionType::YesNo => {
                let labels = ["Yes", "No"].map(String::from);
                let default = match wizard.store().get(&question.id) {
                    Some(Answer::YesNo(false)) => 1,
                    _ => 0,
                };
                match select(theme, &question.text, &labels, default)? {
                    Some(index) => Answer::YesNo(index == 0),
                    None => return Ok(()),
                }
            }
            QuestionType::MultipleChoice => {
                let labels: Vec<String> = question.choices.iter().map(|c| c.text.clone()).collect();
                let selected = match wizard.store().get(&question.id) {
                    Some(Answer::Choice(id)) => question.choices.iter().position(|c| c.id == *id),
                    _ => None,
                };
                match select(theme, &question.text, &labels, selected.unwrap_or(0))? {
                    Some(index) => Answer::Choice(question.choices[index].id),
                    None => return Ok(()),
                }
            }
            QuestionType::ShortAnswer => {
                let input = prompt_text(theme, &format!("{} [{current}]", question.text))?;
                if input.trim().is_empty() {
                    return Ok(());
                }
                match parse_answer(question, &input) {
                    Ok(answer) => answer,
                    Err(message) => {
                        eprintln!("error: {message}");
                        continue;
                    }
                }
            }
        };
        if wizard.store().get(&question.id) == Some(&answer) {
            return Ok(());
        }
        match wizard.answer(&question.id, answer) {
            Ok(()) => return Ok(()),
            Err(e) => eprintln!("error: {e}"),
        }
    }
}

#[derive(Default)]
struct TermPrompter {
    theme: ColorfulTheme,
}

impl Prompter for TermPrompter {
    fn confirm_submit(&self, title: &str, message: &str) -> bool {
        println!("{message}");
        confirm_action(&self.theme, title, false).unwrap_or(false)
    }

    fn unsaved_changes(&self) -> UnsavedChoice {
        const CHOICES: [UnsavedChoice; 3] = [
            UnsavedChoice::SaveAndReturn,
            UnsavedChoice::Discard,
            UnsavedChoice::Stay,
        ];
        let labels = ["Save and return", "Discard changes", "Stay"].map(String::from);
        match select(&self.theme, "You have unsaved changes", &labels, 0) {
            Ok(Some(index)) => CHOICES[index],
            Ok(None) | Err(_) => UnsavedChoice::Stay,
        }
    }
}

/// Non-interactive runs: confirm and save.
struct AutoConfirm;

impl Prompter for AutoConfirm {
    fn confirm_submit(&self, _title: &str, _message: &str) -> bool {
        true
    }

    fn unsaved_changes(&self) -> UnsavedChoice {
        UnsavedChoice::SaveAndReturn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskportal_core::questionnaire::Choice;

    fn question(question_type: QuestionType) -> Question {
        Question {
            id: 1.into(),
            question_type,
            text: "Q".into(),
            weight: 10.0,
            section: None,
            choices: vec![
                Choice { id: 10, text: "Cloud".into(), modifier: 1.0 },
                Choice { id: 11, text: "On-prem".into(), modifier: 2.0 },
            ],
            required: true,
        }
    }

    #[test]
    fn yes_no_accepts_common_spellings() {
        let q = question(QuestionType::YesNo);
        assert_eq!(parse_answer(&q, "Y"), Ok(Answer::YesNo(true)));
        assert_eq!(parse_answer(&q, "no"), Ok(Answer::YesNo(false)));
        assert!(parse_answer(&q, "maybe").is_err());
    }

    #[test]
    fn choices_match_by_id_or_text() {
        let q = question(QuestionType::MultipleChoice);
        assert_eq!(parse_answer(&q, "11"), Ok(Answer::Choice(11)));
        assert_eq!(parse_answer(&q, "cloud"), Ok(Answer::Choice(10)));
        assert!(parse_answer(&q, "3").is_err());
    }

    #[test]
    fn submit_replaces_next_on_the_last_section() {
        assert_eq!(MenuAction::menu(false)[0], MenuAction::Next);
        assert_eq!(MenuAction::menu(true)[0], MenuAction::Submit);
        assert!(MenuAction::menu(true).contains(&MenuAction::Quit));
    }

    #[test]
    fn file_questions_are_not_typed_in() {
        assert!(parse_answer(&question(QuestionType::FileUpload), "a.pdf").is_err());
    }
}
