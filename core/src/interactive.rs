pub mod util {
    use dialoguer::{theme::ColorfulTheme, Input};
    use std::io;

    fn theme() -> ColorfulTheme {
        ColorfulTheme::default()
    }

    pub fn ask_text(prompt: &str) -> io::Result<String> {
        Input::with_theme(&theme())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
    }
}
