//! Terminal rendering of contact-form feedback.

use portfolio_core::{Contacto, ContactoField, ContactoView, FieldError, Notification, NotificationLevel};
use std::io::{self, BufRead, Write};

const ACCEPTED_ANSWERS: &[&str] = &["s", "si", "sí", "y", "yes"];

pub struct TerminalView {
    assume_yes: bool,
}

impl TerminalView {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl ContactoView for TerminalView {
    fn render_contacts(&mut self, contacts: &[Contacto]) {
        if contacts.is_empty() {
            println!("(sin contactos guardados)");
            return;
        }
        println!(
            "{:<18} {:<24} {:<32} {:<9} ASUNTO",
            "ID", "NOMBRE", "EMAIL", "PREF"
        );
        for contacto in contacts {
            println!(
                "{:<18} {:<24} {:<32} {:<9} {}",
                contacto.id(),
                truncate(contacto.nombre(), 24),
                truncate(contacto.email(), 32),
                contacto.preferencia_contacto(),
                truncate(contacto.asunto(), 40)
            );
        }
        println!("{} contacto(s)", contacts.len());
    }

    fn show_field_errors(&mut self, errors: &[FieldError]) {
        for error in errors {
            eprintln!("  x {}: {}", error.field, error.message);
        }
    }

    // Inline errors are printed once and never persist on a terminal.
    fn clear_field_error(&mut self, _field: ContactoField) {}

    fn clear_field_errors(&mut self) {}

    fn reset_form(&mut self) {}

    fn notify(&mut self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => println!("[ok] {}", notification.message),
            NotificationLevel::Info => println!("[info] {}", notification.message),
            NotificationLevel::Warning => eprintln!("[aviso] {}", notification.message),
            NotificationLevel::Error => eprintln!("[error] {}", notification.message),
        }
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        print!("{prompt} [s/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        let normalized = answer.trim().to_lowercase();
        ACCEPTED_ANSWERS.contains(&normalized.as_str())
    }
}

/// Prints every field of one record.
pub fn print_detail(contacto: &Contacto) {
    println!("id:                  {}", contacto.id());
    println!("nombre:              {}", contacto.nombre());
    println!("email:               {}", contacto.email());
    println!("telefono:            {}", contacto.telefono().unwrap_or("-"));
    println!("asunto:              {}", contacto.asunto());
    println!("mensaje:             {}", contacto.mensaje().unwrap_or("-"));
    println!("preferenciaContacto: {}", contacto.preferencia_contacto());
    println!("aceptaTerminos:      {}", contacto.acepta_terminos());
    println!("fechaCreacion:       {}", contacto.fecha_creacion());
    println!("fechaActualizacion:  {}", contacto.fecha_actualizacion());
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut shortened: String = value.chars().take(max_chars.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncate_keeps_short_values() {
        assert_eq!(truncate("Ana", 5), "Ana");
        assert_eq!(truncate("Ana Ruiz", 5), "Ana …");
    }
}
