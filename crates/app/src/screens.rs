use std::path::Path;
use std::time::Duration;

use log::warn;
use rand::Rng;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use prep_core::mistakes::REMOVAL_GRACE_MS;
use prep_core::model::{Category, Question};
use prep_core::navigation::{has_next, has_previous};
use prep_core::{
    Direction, NotificationCenter, NotificationKind, ProgressEvent, QuestionAttempt,
    ReviewPosition,
};
use services::{AppServices, TutorChat, TutorService};

type Input = Lines<BufReader<Stdin>>;

fn input() -> Input {
    BufReader::new(tokio::io::stdin()).lines()
}

async fn prompt(lines: &mut Input, label: &str) -> std::io::Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;
    lines.next_line().await
}

/// One line of input on a question card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardCommand {
    Answer(usize),
    Next,
    Previous,
    EliminateTwo,
    Hint,
    Explain,
    Quit,
}

impl CardCommand {
    fn parse(line: &str) -> Option<Self> {
        match line {
            "a" => Some(Self::Answer(0)),
            "b" => Some(Self::Answer(1)),
            "c" => Some(Self::Answer(2)),
            "d" => Some(Self::Answer(3)),
            "n" => Some(Self::Next),
            "p" => Some(Self::Previous),
            "x" => Some(Self::EliminateTwo),
            "h" => Some(Self::Hint),
            "e" => Some(Self::Explain),
            "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Handles the delete-two, hint and explain commands shared by both modes.
/// Returns `false` for any other command.
async fn assist(
    command: CardCommand,
    question: &Question,
    attempt: &mut QuestionAttempt,
    tutor: &TutorService,
    rng: &mut impl Rng,
) -> bool {
    match command {
        CardCommand::EliminateTwo => {
            if attempt.eliminate_two(rng).is_none() {
                println!("تمت الإجابة على هذا السؤال بالفعل.");
            }
        }
        CardCommand::Hint => {
            let hint = tutor.hint(question.text(), question.options()).await;
            attempt.accept_hint(question.id(), hint);
        }
        CardCommand::Explain => {
            let text = tutor.explain_question(question).await;
            attempt.accept_explanation(question.id(), text);
            if let Some(text) = attempt.explanation() {
                println!("🤖 {text}");
            }
        }
        _ => return false,
    }
    true
}

/// Reuses the attempt while the card stays on the same question.
fn attempt_for<'a>(
    slot: &'a mut Option<QuestionAttempt>,
    question: &Question,
) -> &'a mut QuestionAttempt {
    if slot
        .as_ref()
        .is_none_or(|current| current.question_id() != question.id())
    {
        *slot = Some(QuestionAttempt::new(question));
    }
    slot.get_or_insert_with(|| QuestionAttempt::new(question))
}

//
// ─── RENDERING ─────────────────────────────────────────────────────────────────
//

fn print_question(question: &Question, attempt: &QuestionAttempt) {
    println!();
    println!(
        "[{}] [{}] {}",
        question.category().label(),
        question.difficulty().label(),
        question.text()
    );
    for (index, option) in question.options().iter().enumerate() {
        let label = question.option_label(index).unwrap_or('?');
        if attempt.is_eliminated(index) {
            println!("  {label}) ---");
        } else {
            println!("  {label}) {option}");
        }
    }
}

fn print_feedback(question: &Question, selected: usize, is_correct: bool) {
    let explanation = question.explanation();
    if is_correct {
        println!("✅ إجابة صحيحة!");
    } else {
        let correct = question.correct_answer_index();
        let label = question.option_label(correct).unwrap_or('?');
        if let Some(text) = question.options().get(correct) {
            println!("❌ إجابة خاطئة. الإجابة الصحيحة: {label}) {text}");
        }
        if let Some(reason) = question.why_wrong(selected) {
            println!("   لماذا اختيارك خاطئ: {reason}");
        }
    }
    println!("   {}", explanation.why_correct);
    for method in [&explanation.method1, &explanation.method2, &explanation.method3] {
        if !method.is_empty() {
            println!("   • {method}");
        }
    }
}

fn announce(center: &mut NotificationCenter, events: &[ProgressEvent], app: &AppServices) {
    let now = app.clock().now();
    center.show_events(events, now);
    if let Some(notification) = center.visible(now) {
        match notification.kind {
            NotificationKind::LevelUp => println!("🏆 {}", notification.message),
            NotificationKind::Generic => println!("🔔 {}", notification.message),
        }
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

pub async fn quiz(app: &mut AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = app.catalog();
    let tutor = app.tutor();
    let mut lines = input();
    let mut center = NotificationCenter::new();
    let mut rng = rand::rng();

    let mut attempt: Option<QuestionAttempt> = None;
    loop {
        let index = app.progress().current_question_index();
        let Some(question) = catalog.at(index) else {
            println!("لا توجد أسئلة.");
            return Ok(());
        };
        let current = attempt_for(&mut attempt, question);

        let stats = app.progress().stats();
        println!();
        println!(
            "مستوى {} · {} XP · السؤال {} من {}",
            stats.level(),
            stats.xp(),
            index + 1,
            catalog.len()
        );
        print_question(question, current);
        if let Some(hint) = current.hint() {
            println!("💡 {hint}");
        }

        let menu = "[a-d] إجابة · n/p تنقل · x حذف إجابتين · h تلميح · e شرح · q خروج > ";
        let Some(line) = prompt(&mut lines, menu).await? else {
            return Ok(());
        };
        let line = line.trim().to_lowercase();
        let Some(command) = CardCommand::parse(&line) else {
            println!("أمر غير معروف: {line}");
            continue;
        };

        match command {
            CardCommand::Quit => return Ok(()),
            CardCommand::Next if has_next(index, catalog.len()) => {
                app.progress_mut().advance_cursor(Direction::Next).await;
            }
            CardCommand::Previous if has_previous(index) => {
                app.progress_mut().advance_cursor(Direction::Previous).await;
            }
            CardCommand::Next | CardCommand::Previous => {
                println!("لا يوجد سؤال في هذا الاتجاه.");
            }
            CardCommand::Answer(selected) => match current.select(selected) {
                Ok(is_correct) => {
                    print_feedback(question, selected, is_correct);
                    let events = app
                        .progress_mut()
                        .submit_answer(question.id(), question.category(), is_correct)
                        .await;
                    announce(&mut center, &events, app);
                }
                Err(err) => println!("{err}"),
            },
            other => {
                assist(other, question, current, &tutor, &mut rng).await;
            }
        }
    }
}

//
// ─── REVIEW ────────────────────────────────────────────────────────────────────
//

pub async fn review(app: &mut AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = app.catalog();
    let tutor = app.tutor();
    let mut lines = input();
    let mut center = NotificationCenter::new();
    let mut rng = rand::rng();

    let mut attempt: Option<QuestionAttempt> = None;
    loop {
        let remaining = app.progress().mistakes().len();
        let question_id = match app.progress().review_position() {
            ReviewPosition::AllClear => {
                println!();
                println!("🏆 سجل خالٍ من الأخطاء!");
                println!("أنتِ مذهلة يا لين! لقد قمتِ بتصحيح جميع أخطائك.");
                return Ok(());
            }
            ReviewPosition::At { question_id, .. } => question_id,
        };
        let Some(question) = catalog.get(question_id) else {
            warn!("question {question_id} is not in the catalog, dropping it from review");
            app.progress_mut().dequeue_if_correct(question_id).await;
            continue;
        };
        let current = attempt_for(&mut attempt, question);

        println!();
        println!("Kill Mistakes 🎯 · {remaining} أخطاء متبقية");
        print_question(question, current);
        if let Some(hint) = current.hint() {
            println!("💡 {hint}");
        }

        let menu = "[a-d] إجابة · n التالي · x حذف إجابتين · h تلميح · e شرح · q خروج > ";
        let Some(line) = prompt(&mut lines, menu).await? else {
            return Ok(());
        };
        let line = line.trim().to_lowercase();
        let Some(command) = CardCommand::parse(&line) else {
            println!("أمر غير معروف: {line}");
            continue;
        };

        match command {
            CardCommand::Quit => return Ok(()),
            CardCommand::Next => {
                // A one-item queue cycles back to the same card, so start fresh.
                attempt = None;
                app.progress_mut().review_next();
            }
            CardCommand::Previous => println!("لا يوجد سؤال في هذا الاتجاه."),
            CardCommand::Answer(selected) => match current.select(selected) {
                Ok(true) => {
                    let events = app.progress_mut().submit_review_answer(true);
                    announce(&mut center, &events, app);
                    println!("✅ إجابة صحيحة!");
                    let grace = u64::try_from(REMOVAL_GRACE_MS).unwrap_or(1_500);
                    tokio::time::sleep(Duration::from_millis(grace)).await;
                    let events = app.progress_mut().commit_due_removals().await;
                    announce(&mut center, &events, app);
                }
                Ok(false) => {
                    print_feedback(question, selected, false);
                    let events = app.progress_mut().submit_review_answer(false);
                    announce(&mut center, &events, app);
                }
                Err(err) => println!("{err}"),
            },
            other => {
                assist(other, question, current, &tutor, &mut rng).await;
            }
        }
    }
}

//
// ─── DASHBOARD ─────────────────────────────────────────────────────────────────
//

pub fn stats(app: &AppServices) {
    let stats = app.progress().stats();
    println!("المستوى {}", stats.level());
    println!(
        "التقدم للمستوى {}: {}/100 ({} XP)",
        stats.level() + 1,
        stats.xp_into_level(),
        stats.xp()
    );
    println!("الأسئلة المنجزة: {}", stats.total_answered());
    println!("الإجابات الصحيحة: {}", stats.correct_answers());
    println!("الإجابات الخاطئة: {}", stats.wrong_answers());
    println!("الدقة: {}%", stats.accuracy_percent());
    println!("سلسلة الحماس: {} 🔥", stats.streak());
    println!("أخطاء للمراجعة: {}", app.progress().mistakes().len());
    println!();
    for category in Category::ALL {
        let score = stats.category(category);
        println!(
            "  {:<12} {}/{} ({}%)",
            category.label(),
            score.correct,
            score.total,
            score.accuracy_percent()
        );
    }
}

//
// ─── TUTOR ─────────────────────────────────────────────────────────────────────
//

pub async fn report(
    app: &AppServices,
    out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = app.tutor().generate_report(app.progress().stats()).await;
    match out {
        Some(path) => {
            tokio::fs::write(path, text).await?;
            println!("{}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

pub async fn tutor(app: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let tutor = app.tutor();
    let mut chat = TutorChat::new(app.clock());
    let mut lines = input();

    if let Some(greeting) = chat.messages().first() {
        println!("🤖 {}", greeting.text);
    }
    while let Some(line) = prompt(&mut lines, "> ").await? {
        match line.trim() {
            "/q" => break,
            "/clear" => {
                chat.clear();
                println!("🤖 {}", chat.messages()[0].text);
            }
            text => {
                if let Some(reply) = chat.send(&tutor, text).await {
                    println!("🤖 {}", reply.text);
                }
            }
        }
    }
    Ok(())
}
