use std::sync::{Arc, Barrier};
use std::thread;

use secretary_common::Error;
use secretary_vault::{KeySource, KeySourceRegistry, MemoryEnvironment};

const THREADS: usize = 8;

fn registry() -> KeySourceRegistry<Arc<MemoryEnvironment>> {
    KeySourceRegistry::with_environment(Arc::new(MemoryEnvironment::new()))
}

#[test]
fn concurrent_resolution_converges_on_one_instance() {
    let registry = registry();
    registry.environment().set("SHARED_SECRET", "s3cr3t");
    let barrier = Barrier::new(THREADS);

    let resolved: Vec<Arc<KeySource>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    registry.resolve("env://SHARED_SECRET").unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let cached = registry.resolve("env://SHARED_SECRET").unwrap();
    for source in &resolved {
        assert_eq!(**source, *cached);
    }
    assert_eq!(registry.len(), 1);

    // Every caller after the race gets the exact cached instance.
    let again = registry.resolve("env://SHARED_SECRET").unwrap();
    assert!(Arc::ptr_eq(&cached, &again));
}

#[test]
fn concurrent_resolution_of_distinct_descriptors_keeps_all() {
    let registry = registry();
    let barrier = Barrier::new(THREADS);

    thread::scope(|scope| {
        for i in 0..THREADS {
            let registry = &registry;
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                registry.resolve(&format!("passwd://secret{}", i)).unwrap();
            });
        }
    });

    assert_eq!(registry.len(), THREADS);
    for i in 0..THREADS {
        assert!(registry.is_cached(&format!("passwd://secret{}", i)));
    }
}

#[test]
fn concurrent_encrypt_decrypt_roundtrip() {
    let registry = registry();

    thread::scope(|scope| {
        for i in 0..THREADS {
            let registry = &registry;
            scope.spawn(move || {
                let text = format!("message {}", i);
                let encrypted = registry.encrypt_text("passwd://secret", &text).unwrap();
                assert_eq!(
                    registry.decrypt_text("passwd://secret", &encrypted).unwrap(),
                    text
                );
            });
        }
    });

    assert_eq!(registry.len(), 1);
}

#[test]
fn missing_variable_then_set_succeeds() {
    let registry = registry();

    assert_eq!(
        registry.resolve("env://MISSING_VAR").unwrap_err(),
        Error::EnvironmentVariableNotFound("MISSING_VAR".to_string())
    );

    registry.environment().set("MISSING_VAR", "late");
    let encrypted = registry.encrypt_text("env://MISSING_VAR", "attack at dawn").unwrap();

    // A literal source with the same passphrase decrypts it.
    assert_eq!(
        registry.decrypt_text("passwd://late", &encrypted).unwrap(),
        "attack at dawn"
    );
}

#[test]
fn repeated_encryptions_differ_but_decrypt() {
    let registry = registry();

    let a = registry.encrypt_text("passwd://secret", "same").unwrap();
    let b = registry.encrypt_text("passwd://secret", "same").unwrap();

    assert_ne!(a, b);
    assert_eq!(registry.decrypt_text("passwd://secret", &a).unwrap(), "same");
    assert_eq!(registry.decrypt_text("passwd://secret", &b).unwrap(), "same");
}

#[test]
fn process_environment_registry() {
    let registry = KeySourceRegistry::new();
    assert!(matches!(
        registry.resolve("env://SECRETARY_TEST_NEVER_SET_VARIABLE"),
        Err(Error::EnvironmentVariableNotFound(_))
    ));
    assert_eq!(registry.encrypt_text("plain://x", "as is").unwrap(), "as is");
}

#[test]
fn descriptor_with_extra_components_cannot_open_ciphertext() {
    let registry = registry();
    let encrypted = registry.encrypt_text("passwd://secret", "attack at dawn").unwrap();

    for descriptor in [
        "passwd://attacker@secret:99/x",
        "passwd://user@secret",
        "passwd://secret/extra?x#y",
    ] {
        assert!(matches!(
            registry.decrypt_text(descriptor, &encrypted),
            Err(Error::InvalidDescriptor(_))
        ));
        assert!(!registry.is_cached(descriptor));
    }
    assert_eq!(registry.len(), 1);
}
