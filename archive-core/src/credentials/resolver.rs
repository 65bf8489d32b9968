//! Per-entry password trial order (C5): previously-accepted passwords
//! first, then the global/job/prompt sources in the order implied by
//! [`PasswordMode`].

use archive_domain::PasswordMode;
use secrecy::SecretBox;

use super::password_list;

/// A user-supplied callback invoked at most once per resolver lifetime to
/// ask for a password interactively. Returns `None` if the user declines.
pub type PromptFn<'a> = dyn FnMut(&str) -> Option<SecretBox<[u8]>> + 'a;

enum Source {
    Global,
    JobConfig,
    Prompt,
}

/// Iterates candidate passwords for one archive/entry, in the order spec
/// §4.5 defines, calling `prompt_cb` at most once.
pub struct CredentialResolver<'b, 'a: 'b> {
    archive_name: String,
    global_password: Option<SecretBox<[u8]>>,
    job_password: Option<SecretBox<[u8]>>,
    prompt_cb: Option<&'b mut PromptFn<'a>>,
    prompted: bool,
    remaining_list: std::vec::IntoIter<SecretBox<[u8]>>,
    remaining_sources: std::vec::IntoIter<Source>,
}

impl<'b, 'a: 'b> CredentialResolver<'b, 'a> {
    pub fn new(
        archive_name: &str,
        global_password: Option<SecretBox<[u8]>>,
        job_password: Option<SecretBox<[u8]>>,
        mode: PasswordMode,
        prompt_cb: Option<&'b mut PromptFn<'a>>,
    ) -> Self {
        let sources = match mode {
            PasswordMode::Default => vec![Source::Global, Source::JobConfig, Source::Prompt],
            PasswordMode::Config => vec![Source::JobConfig, Source::Global, Source::Prompt],
            PasswordMode::Ask => vec![Source::Prompt],
        };
        Self {
            archive_name: archive_name.to_string(),
            global_password,
            job_password,
            prompt_cb,
            prompted: false,
            remaining_list: password_list::snapshot().into_iter(),
            remaining_sources: sources.into_iter(),
        }
    }

    /// Returns the first candidate password, equivalent to calling `next`
    /// immediately after construction.
    pub fn first(&mut self) -> Option<SecretBox<[u8]>> {
        self.next()
    }

    /// Returns the next candidate password, or `None` once every source has
    /// been exhausted.
    pub fn next(&mut self) -> Option<SecretBox<[u8]>> {
        if let Some(listed) = self.remaining_list.next() {
            return Some(listed);
        }
        while let Some(source) = self.remaining_sources.next() {
            let candidate = match source {
                Source::Global => self.global_password.take(),
                Source::JobConfig => self.job_password.take(),
                Source::Prompt => self.try_prompt(),
            };
            if candidate.is_some() {
                return candidate;
            }
        }
        None
    }

    fn try_prompt(&mut self) -> Option<SecretBox<[u8]>> {
        if self.prompted {
            return None;
        }
        self.prompted = true;
        let cb = self.prompt_cb.as_mut()?;
        cb(&self.archive_name)
    }

    /// Records a password as having successfully unlocked an entry, so it
    /// is tried first for every subsequent entry in this process.
    pub fn accept(password: &SecretBox<[u8]>) {
        password_list::record(password);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn secret(s: &str) -> SecretBox<[u8]> {
        SecretBox::new(s.as_bytes().to_vec().into_boxed_slice())
    }

    #[test]
    fn default_mode_tries_global_then_job_then_prompt() {
        let mut prompt_calls = 0;
        let mut prompt: Box<PromptFn> = Box::new(|_name| {
            prompt_calls += 1;
            Some(secret("prompted"))
        });
        {
            let mut resolver = CredentialResolver::new(
                "archive.bar",
                Some(secret("global")),
                Some(secret("job")),
                PasswordMode::Default,
                Some(&mut *prompt),
            );
            assert_eq!(resolver.first().unwrap().expose_secret(), b"global");
            assert_eq!(resolver.next().unwrap().expose_secret(), b"job");
            assert_eq!(resolver.next().unwrap().expose_secret(), b"prompted");
            assert!(resolver.next().is_none());
        }
        drop(prompt);
        assert_eq!(prompt_calls, 1);
    }

    #[test]
    fn config_mode_prefers_job_password() {
        let mut resolver = CredentialResolver::new(
            "archive.bar",
            Some(secret("global")),
            Some(secret("job")),
            PasswordMode::Config,
            None,
        );
        assert_eq!(resolver.first().unwrap().expose_secret(), b"job");
        assert_eq!(resolver.next().unwrap().expose_secret(), b"global");
        assert!(resolver.next().is_none());
    }

    #[test]
    fn ask_mode_only_prompts_once() {
        let mut calls = 0;
        let mut prompt: Box<PromptFn> = Box::new(|_name| {
            calls += 1;
            Some(secret("asked"))
        });
        {
            let mut resolver =
                CredentialResolver::new("archive.bar", Some(secret("global")), None, PasswordMode::Ask, Some(&mut *prompt));
            assert_eq!(resolver.first().unwrap().expose_secret(), b"asked");
            assert!(resolver.next().is_none());
        }
        drop(prompt);
        assert_eq!(calls, 1);
    }
}
