use httpmock::prelude::*;
use portaria_core::{
    Backend, BackendConfig, BackendError, ConfigError, NewResident, ResidentService,
    SummaryService, DEFAULT_RECENT_LIMIT,
};
use serde_json::json;

fn ana() -> NewResident {
    NewResident {
        first_name: "Ana".to_string(),
        last_name: "Silva".to_string(),
        block: "A".to_string(),
        unit: "101".to_string(),
        phone: "11 98888-7777".to_string(),
    }
}

#[test]
fn local_backend_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = BackendConfig::Local {
        db_path: dir.path().join("portaria.sqlite3"),
    };

    {
        let backend = Backend::open(&config).unwrap();
        assert_eq!(backend.kind(), "local");
        let repo = backend.repository().unwrap();
        ResidentService::new(repo.as_dyn()).create(&ana()).unwrap();
    }

    let backend = Backend::open(&config).unwrap();
    let repo = backend.repository().unwrap();
    let residents = ResidentService::new(repo.as_dyn()).list().unwrap();
    assert_eq!(residents.len(), 1);
    assert_eq!(residents[0].first_name, "Ana");
}

#[test]
fn remote_backend_runs_the_same_use_cases() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/moradores");
        then.status(200).json_body(json!([{
            "id": 1,
            "nome": "Ana",
            "sobrenome": "Silva",
            "bloco": "A",
            "apartamento": "101",
            "telefone": "11 98888-7777"
        }]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/encomendas");
        then.status(200).json_body(json!([]));
    });
    let config = BackendConfig::Remote {
        base_url: server.url("/api"),
        timeout_secs: 5,
    };

    let backend = Backend::open(&config).unwrap();
    assert_eq!(backend.kind(), "remote");
    let repo = backend.repository().unwrap();
    let summary = SummaryService::new(repo.as_dyn())
        .summary(DEFAULT_RECENT_LIMIT)
        .unwrap();

    assert_eq!(summary.resident_count, 1);
    assert_eq!(summary.package_count, 0);
}

#[test]
fn remote_backend_with_bad_url_fails_to_open() {
    let config = BackendConfig::Remote {
        base_url: "ftp://desk.example".to_string(),
        timeout_secs: 5,
    };

    let err = Backend::open(&config).err().unwrap();
    assert!(matches!(
        err,
        BackendError::Config(ConfigError::InvalidApiUrl { .. })
    ));
}

#[test]
fn in_memory_backend_starts_empty() {
    let backend = Backend::open_in_memory().unwrap();
    let repo = backend.repository().unwrap();

    let summary = SummaryService::new(repo.as_dyn())
        .summary(DEFAULT_RECENT_LIMIT)
        .unwrap();
    assert_eq!(summary.resident_count, 0);
}
