use colored::{Color, ColoredString, Colorize};
use crossterm::terminal;
use once_cell::sync::Lazy;

use crate::action::GradeReport;
use crate::grading::{CaseFailure, CaseOutcome, QuestionOutcome, Verdict};

#[macro_export]
macro_rules! print_success {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        use ::colored::Colorize as _;
        println!("{}", format!($fmt $(, $arg)*).green())
    }};
}

static TRUECOLOR_SUPPORTED: Lazy<bool> = Lazy::new(|| {
    matches!(
        std::env::var("COLORTERM").as_deref(),
        Ok("truecolor") | Ok("24bit")
    )
});

pub fn is_truecolor_supported() -> bool {
    *TRUECOLOR_SUPPORTED
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for log::Level {
    fn color(&self) -> Color {
        use log::Level::*;
        match self {
            Error => Color::BrightRed,
            Warn => Color::BrightYellow,
            Info => Color::Cyan,
            Debug => Color::Magenta,
            Trace => Color::Blue,
        }
    }
}

impl ColorTheme for Verdict {
    fn color(&self) -> Color {
        use Verdict::*;
        if !self::is_truecolor_supported() {
            return match self {
                Pass => Color::Green,
                Fail => Color::Yellow,
                Error => Color::Magenta,
                Locked => Color::Blue,
            };
        }

        match self {
            Pass => Color::TrueColor {
                r: 30,
                g: 180,
                b: 40,
            },
            Fail => Color::TrueColor {
                r: 210,
                g: 138,
                b: 4,
            },
            Error => Color::TrueColor {
                r: 171,
                g: 40,
                b: 200,
            },
            Locked => Color::TrueColor {
                r: 70,
                g: 130,
                b: 220,
            },
        }
    }
}

pub fn verdict_icon(verdict: Verdict) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {} ", verdict)
        .on_color(verdict.color())
        .bold()
        .color(fg)
}

fn format_points(x: f64) -> String {
    if x.fract() == 0.0 {
        format!("{:.0}", x)
    } else {
        format!("{}", x)
    }
}

pub fn print_question_result(res: &QuestionOutcome, show_failure_detail: bool) {
    let overall = if res.passed() {
        Verdict::Pass
    } else {
        Verdict::Fail
    };
    println!(
        "{} {} [{}/{} pt]",
        verdict_icon(overall),
        res.name.bold(),
        format_points(res.points_earned),
        format_points(res.points_possible),
    );

    for (si, suite) in res.suites.iter().enumerate() {
        for case in suite.cases.iter().filter(|c| !c.verdict.is_pass()) {
            if case.hidden {
                // never leak a hidden case's content, whatever failed
                println!(
                    "  {} suite {}, case {} (hidden)",
                    verdict_icon(case.verdict),
                    si + 1,
                    case.ord
                );
                continue;
            }
            println!(
                "  {} suite {}, case {}",
                verdict_icon(case.verdict),
                si + 1,
                case.ord
            );
            if show_failure_detail {
                print_case_failure_detail(case);
            }
        }
    }
}

pub fn print_case_failure_detail(case: &CaseOutcome) {
    let Some(failure) = &case.failure else {
        return;
    };

    let (cols, _) = terminal::size().unwrap_or((40, 40));
    let cols = cols as usize;

    const BOLD_LINE: &str = "━";
    const THIN_LINE: &str = "─";

    fn print_sub_title(s: &str, cols: usize) {
        println!(
            "{}{}",
            s.cyan().bold(),
            THIN_LINE.repeat(cols.saturating_sub(s.len() + 1)).bright_black(),
        )
    }

    fn print_text(s: &str) {
        if s.is_empty() {
            println!("{}", "<EMPTY>".magenta().dimmed());
            return;
        }
        for line in s.lines() {
            println!("{}", line);
        }
    }

    println!("{}", BOLD_LINE.repeat(cols).blue().bold());
    match failure {
        CaseFailure::Mismatch {
            prompt,
            expected,
            actual,
        } => {
            println!("{} {}", ">>>".bright_black(), prompt.bold());
            print_sub_title("[expected]", cols);
            print_text(expected);
            print_sub_title("[actual]", cols);
            print_text(actual);
        }
        CaseFailure::Eval { prompt, message } => {
            println!("{} {}", ">>>".bright_black(), prompt.bold());
            print_sub_title("[error]", cols);
            println!("{}", message.bright_red());
        }
        CaseFailure::StillLocked => {
            println!(
                "{}",
                "This case is locked. Run `qgrade unlock` to attempt it.".blue()
            );
        }
    }
}

pub fn print_grade_summary(report: &GradeReport) {
    let bar = "-".repeat(5);
    print!("{} ", bar);

    let num_total = report.outcomes.len();
    let num_passed = report.outcomes.iter().filter(|o| o.passed()).count();
    let num_failed = num_total - num_passed;

    if num_total == 0 {
        print!("{}", "No questions could be graded 💀".bright_red());
    } else if report.all_passed() {
        let msg = format!("All {} questions passed ✨", num_total);
        print!("{}", msg.green());
    } else if num_passed == 0 {
        print!("{}", format!("All {} questions failed 💀", num_total).bright_red());
    } else {
        print!(
            "{}",
            format!("{}/{} questions failed 💣", num_failed, num_total).bright_red()
        );
    }

    print!(
        " | {} pts",
        format!(
            "{}/{}",
            format_points(report.total_earned()),
            format_points(report.total_possible())
        )
        .bold()
    );

    println!(" {}", bar);

    if report.num_load_failures > 0 {
        println!(
            "{}",
            format!(
                "{} question file(s) could not be loaded and were skipped",
                report.num_load_failures
            )
            .bright_red()
            .bold()
        );
    }

    println!(
        "{}",
        format!("Graded at {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")).dimmed()
    );
}
