use std::io::Write;

use fallo_core::{CaseFacts, format_list};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

const DIVIDER_WIDTH: usize = 100;

fn print_divider(w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "{}", "_".repeat(DIVIDER_WIDTH))?;
    writeln!(w)
}

fn print_field(w: &mut dyn Write, label: &str, value: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} ->  {}", label.bold(), value)
    } else {
        writeln!(w, "{} ->  {}", label, value)
    }
}

/// Print the four extracted facts between two divider lines.
pub fn print_case_facts(w: &mut dyn Write, facts: &CaseFacts, color: ColorMode) -> std::io::Result<()> {
    print_divider(w)?;
    print_field(w, "Materia del caso", &facts.subject_matter, color)?;
    print_field(w, "Fechas encontradas", &format_list(&facts.dates), color)?;
    print_field(w, "Declaración del caso", &facts.ruling, color)?;
    print_field(w, "Personas involucradas", &format_list(&facts.persons), color)?;
    print_divider(w)
}

/// Print the facts as a pretty JSON object.
pub fn print_json(w: &mut dyn Write, facts: &CaseFacts) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *w, facts).map_err(std::io::Error::from)?;
    writeln!(w)
}

/// Print the raw text acquired from a PDF.
pub fn print_text(w: &mut dyn Write, file_name: &str, text: &str, color: ColorMode) -> std::io::Result<()> {
    let chars = text.chars().count();
    if color.enabled() {
        writeln!(w, "{} {} ({} characters)\n", "TEXT:".bold().cyan(), file_name.bold(), chars)?;
    } else {
        writeln!(w, "TEXT: {} ({} characters)\n", file_name, chars)?;
    }
    w.write_all(text.as_bytes())?;
    if !text.is_empty() && !text.ends_with('\n') {
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(facts: &CaseFacts) -> String {
        let mut buf = Vec::new();
        print_case_facts(&mut buf, facts, ColorMode(false)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn human_report_layout() {
        let facts = CaseFacts {
            subject_matter: "Juzgado Contencioso Administrativo".into(),
            dates: vec!["17 de junio de 2021".into()],
            ruling: "se declara admisible".into(),
            persons: vec![],
        };
        let divider = "_".repeat(100);
        let expected = format!(
            "{divider}\n\n\
             Materia del caso ->  Juzgado Contencioso Administrativo\n\
             Fechas encontradas ->  ['17 de junio de 2021']\n\
             Declaración del caso ->  se declara admisible\n\
             Personas involucradas ->  []\n\
             {divider}\n\n"
        );
        assert_eq!(render(&facts), expected);
    }

    #[test]
    fn empty_facts_still_print_all_labels() {
        let out = render(&CaseFacts::default());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 7, "unexpected layout:\n{out}");
        assert_eq!(lines[2], "Materia del caso ->  ");
        assert_eq!(lines[3], "Fechas encontradas ->  []");
        assert_eq!(lines[4], "Declaración del caso ->  ");
        assert_eq!(lines[5], "Personas involucradas ->  []");
    }

    #[test]
    fn colored_labels_keep_values_plain() {
        let facts = CaseFacts {
            persons: vec!["Juan Pérez".into(), "Juan Pérez".into()],
            ..Default::default()
        };
        let mut buf = Vec::new();
        print_case_facts(&mut buf, &facts, ColorMode(true)).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("\u{1b}["), "expected ANSI escapes in:\n{out}");
        assert!(out.contains("->  ['Juan Pérez', 'Juan Pérez']"));
    }

    #[test]
    fn json_uses_field_names() {
        let facts = CaseFacts {
            subject_matter: "Juzgado Penal Federal".into(),
            dates: vec!["3 de marzo de 2020".into()],
            ruling: String::new(),
            persons: vec!["Juan Pérez".into()],
        };
        let mut buf = Vec::new();
        print_json(&mut buf, &facts).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["subject_matter"], "Juzgado Penal Federal");
        assert_eq!(value["dates"][0], "3 de marzo de 2020");
        assert_eq!(value["ruling"], "");
        assert_eq!(value["persons"][0], "Juan Pérez");
    }

    #[test]
    fn text_dump_ends_with_newline() {
        let mut buf = Vec::new();
        print_text(&mut buf, "fallo.pdf", "Juzgado", ColorMode(false)).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "TEXT: fallo.pdf (7 characters)\n\nJuzgado\n");
    }
}
