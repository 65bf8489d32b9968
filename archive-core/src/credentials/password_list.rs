//! Process-wide list of previously-accepted passwords (spec: "every
//! previously-accepted password... is always yielded first... in insertion
//! order"), guarded by a mutex so multiple archive jobs in the same process
//! share it.

use std::sync::{Mutex, OnceLock};

use secrecy::SecretBox;

fn global_list() -> &'static Mutex<Vec<SecretBox<[u8]>>> {
    static LIST: OnceLock<Mutex<Vec<SecretBox<[u8]>>>> = OnceLock::new();
    LIST.get_or_init(|| Mutex::new(Vec::new()))
}

/// Snapshot of every password accepted so far in this process, in
/// insertion order. Cloned out from behind the lock so callers can iterate
/// without holding it.
pub fn snapshot() -> Vec<SecretBox<[u8]>> {
    let guard = global_list().lock().expect("password list mutex poisoned");
    guard.iter().map(|p| SecretBox::new(p.expose_secret_cloned())).collect()
}

/// Records a newly-accepted password, unless byte-identical to one already
/// stored.
pub fn record(password: &SecretBox<[u8]>) {
    use secrecy::ExposeSecret;
    let mut guard = global_list().lock().expect("password list mutex poisoned");
    let bytes = password.expose_secret();
    if guard.iter().any(|p| p.expose_secret() == bytes) {
        return;
    }
    guard.push(SecretBox::new(bytes.to_vec().into_boxed_slice()));
}

/// Test-only: clears the process-wide list so test cases don't leak state
/// into each other.
#[cfg(test)]
pub fn clear() {
    global_list().lock().expect("password list mutex poisoned").clear();
}

trait ExposeSecretCloned {
    fn expose_secret_cloned(&self) -> Box<[u8]>;
}

impl ExposeSecretCloned for SecretBox<[u8]> {
    fn expose_secret_cloned(&self) -> Box<[u8]> {
        use secrecy::ExposeSecret;
        self.expose_secret().to_vec().into_boxed_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::sync::Mutex as StdMutex;

    static TEST_GUARD: StdMutex<()> = StdMutex::new(());

    #[test]
    fn record_deduplicates_and_preserves_order() {
        let _guard = TEST_GUARD.lock().unwrap();
        clear();
        record(&SecretBox::new(b"alpha".to_vec().into_boxed_slice()));
        record(&SecretBox::new(b"beta".to_vec().into_boxed_slice()));
        record(&SecretBox::new(b"alpha".to_vec().into_boxed_slice()));
        let snap = snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].expose_secret(), b"alpha");
        assert_eq!(snap[1].expose_secret(), b"beta");
        clear();
    }
}
