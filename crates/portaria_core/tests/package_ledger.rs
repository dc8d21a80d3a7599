use portaria_core::db::open_db_in_memory;
use portaria_core::{
    ArrivalNotification, LocalRepository, NewPackage, NewResident, Notifier, NotifyError,
    PackageId, PackagePatch, PackageService, PickupState, PortariaError, Resident, ResidentId,
    ResidentService,
};
use regex::Regex;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<ArrivalNotification>>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &ArrivalNotification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _notification: &ArrivalNotification) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("gateway offline".to_string()))
    }
}

fn seed_resident(repo: &LocalRepository<'_>, first: &str, phone: &str) -> Resident {
    ResidentService::new(repo)
        .create(&NewResident {
            first_name: first.to_string(),
            last_name: "Silva".to_string(),
            block: "A".to_string(),
            unit: "101".to_string(),
            phone: phone.to_string(),
        })
        .unwrap()
}

fn shopee_for(resident: &Resident) -> NewPackage {
    NewPackage {
        resident_id: resident.id.clone(),
        origin: "Shopee".to_string(),
        description: Some("caixa pequena".to_string()),
    }
}

#[test]
fn create_issues_six_digit_token_and_pending_state() {
    let conn = open_db_in_memory().unwrap();
    let repo = LocalRepository::try_new(&conn).unwrap();
    let ana = seed_resident(&repo, "Ana", "11 98888-7777");
    let service = PackageService::new(&repo);

    let registered = service.create(&shopee_for(&ana)).unwrap();
    let package = registered.package;

    let token_re = Regex::new(r"^[1-9][0-9]{5}$").unwrap();
    assert!(token_re.is_match(&package.token), "token {}", package.token);
    assert_eq!(package.state(), PickupState::Pending);
    assert!(package.picked_up_at.is_none());
    assert!(package.received_at > 0);
    assert_eq!(package.resident_id.as_ref(), Some(&ana.id));
    assert_eq!(package.resident.as_ref().map(|r| r.first_name.as_str()), Some("Ana"));

    let loaded = service.get(&package.id).unwrap();
    assert_eq!(loaded, package);
    assert_eq!(service.find_by_token(&format!(" {} ", package.token)).unwrap().id, package.id);
}

#[test]
fn create_for_unknown_resident_or_blank_origin_fails() {
    let conn = open_db_in_memory().unwrap();
    let repo = LocalRepository::try_new(&conn).unwrap();
    let ana = seed_resident(&repo, "Ana", "11 98888-7777");
    let service = PackageService::new(&repo);

    let ghost = NewPackage {
        resident_id: ResidentId::from("ghost"),
        ..shopee_for(&ana)
    };
    assert!(matches!(
        service.create(&ghost).unwrap_err(),
        PortariaError::ResidentNotFound(_)
    ));

    let blank_origin = NewPackage {
        origin: "  ".to_string(),
        ..shopee_for(&ana)
    };
    assert_eq!(service.create(&blank_origin).unwrap_err().code(), "validation");
    assert!(service.list().unwrap().is_empty());
}

#[test]
fn arrival_notification_carries_link_and_token() {
    let conn = open_db_in_memory().unwrap();
    let repo = LocalRepository::try_new(&conn).unwrap();
    let ana = seed_resident(&repo, "Ana", "(11) 98888-7777");
    let notifier = RecordingNotifier::default();
    let service = PackageService::with_notifier(&repo, Box::new(notifier.clone()));

    let registered = service.create(&shopee_for(&ana)).unwrap();

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let notice = &sent[0];
    assert_eq!(Some(notice), registered.notification.as_ref());
    assert!(notice.link.starts_with("https://wa.me/5511988887777?text="));
    assert!(notice.message.contains("Olá Ana!"));
    assert!(notice.message.contains("(Shopee)"));
    assert!(notice
        .message
        .contains(&format!("Token: {}", registered.package.token)));
}

#[test]
fn resident_without_phone_digits_gets_no_notification() {
    let conn = open_db_in_memory().unwrap();
    let repo = LocalRepository::try_new(&conn).unwrap();
    let ana = seed_resident(&repo, "Ana", "sem telefone");
    let notifier = RecordingNotifier::default();
    let service = PackageService::with_notifier(&repo, Box::new(notifier.clone()));

    let registered = service.create(&shopee_for(&ana)).unwrap();

    assert!(registered.notification.is_none());
    assert!(notifier.sent.lock().unwrap().is_empty());
}

#[test]
fn notifier_failure_does_not_fail_registration() {
    let conn = open_db_in_memory().unwrap();
    let repo = LocalRepository::try_new(&conn).unwrap();
    let ana = seed_resident(&repo, "Ana", "11 98888-7777");
    let service = PackageService::with_notifier(&repo, Box::new(FailingNotifier));

    let registered = service.create(&shopee_for(&ana)).unwrap();

    assert!(registered.notification.is_some());
    assert_eq!(service.list().unwrap().len(), 1);
}

#[test]
fn update_edits_fields_but_keeps_token_and_pickup_state() {
    let conn = open_db_in_memory().unwrap();
    let repo = LocalRepository::try_new(&conn).unwrap();
    let ana = seed_resident(&repo, "Ana", "11 98888-7777");
    let bruno = seed_resident(&repo, "Bruno", "11 97777-6666");
    let service = PackageService::new(&repo);
    let original = service.create(&shopee_for(&ana)).unwrap().package;

    let updated = service
        .update(
            &original.id,
            &PackagePatch {
                resident_id: Some(bruno.id.clone()),
                origin: Some("Mercado Livre".to_string()),
                description: Some(" ".to_string()),
            },
        )
        .unwrap();

    assert_eq!(updated.origin, "Mercado Livre");
    assert_eq!(updated.description, None);
    assert_eq!(updated.resident_id.as_ref(), Some(&bruno.id));
    assert_eq!(updated.resident.map(|r| r.first_name), Some("Bruno".to_string()));
    assert_eq!(updated.token, original.token);
    assert_eq!(updated.received_at, original.received_at);
    assert!(!updated.picked_up);
}

#[test]
fn update_rejects_unknown_resident_and_unknown_package() {
    let conn = open_db_in_memory().unwrap();
    let repo = LocalRepository::try_new(&conn).unwrap();
    let ana = seed_resident(&repo, "Ana", "11 98888-7777");
    let service = PackageService::new(&repo);
    let package = service.create(&shopee_for(&ana)).unwrap().package;

    let reassign = PackagePatch {
        resident_id: Some(ResidentId::from("ghost")),
        ..PackagePatch::default()
    };
    assert!(matches!(
        service.update(&package.id, &reassign).unwrap_err(),
        PortariaError::ResidentNotFound(_)
    ));

    let rename = PackagePatch {
        origin: Some("Amazon".to_string()),
        ..PackagePatch::default()
    };
    let missing = PackageId::from("missing");
    assert!(matches!(
        service.update(&missing, &rename).unwrap_err(),
        PortariaError::PackageNotFound(id) if id == missing
    ));
}

#[test]
fn delete_removes_package_and_token() {
    let conn = open_db_in_memory().unwrap();
    let repo = LocalRepository::try_new(&conn).unwrap();
    let ana = seed_resident(&repo, "Ana", "11 98888-7777");
    let service = PackageService::new(&repo);
    let package = service.create(&shopee_for(&ana)).unwrap().package;

    service.delete(&package.id).unwrap();

    assert!(service.list().unwrap().is_empty());
    assert!(matches!(
        service.find_by_token(&package.token).unwrap_err(),
        PortariaError::TokenNotFound
    ));
    assert!(service.delete(&package.id).unwrap_err().is_not_found());
}

#[test]
fn reminder_link_carries_full_name_and_token() {
    let conn = open_db_in_memory().unwrap();
    let repo = LocalRepository::try_new(&conn).unwrap();
    let ana = seed_resident(&repo, "Ana", "(11) 98888-7777");
    let notifier = RecordingNotifier::default();
    let service = PackageService::with_notifier(&repo, Box::new(notifier.clone()));
    let package = service.create(&shopee_for(&ana)).unwrap().package;

    let reminder = service.notify(&package.id).unwrap();

    assert_eq!(reminder.package_id, package.id.to_string());
    assert!(reminder.message.starts_with("Olá Ana Silva!"));
    assert!(reminder
        .message
        .contains(&format!("Token para retirada: *{}*", package.token)));
    assert!(reminder.link.starts_with("https://wa.me/5511988887777?text="));
    assert_eq!(notifier.sent.lock().unwrap().len(), 1);
}

#[test]
fn reminder_requires_a_phone_with_digits() {
    let conn = open_db_in_memory().unwrap();
    let repo = LocalRepository::try_new(&conn).unwrap();
    let ana = seed_resident(&repo, "Ana", "sem telefone");
    let service = PackageService::new(&repo);
    let package = service.create(&shopee_for(&ana)).unwrap().package;

    let err = service.notify(&package.id).unwrap_err();

    assert_eq!(err.code(), "validation");
    assert!(err.to_string().contains("telefone"));
}

#[test]
fn reminder_for_orphaned_package_reports_missing_resident() {
    let conn = open_db_in_memory().unwrap();
    let repo = LocalRepository::try_new(&conn).unwrap();
    let ana = seed_resident(&repo, "Ana", "11 98888-7777");
    let service = PackageService::new(&repo);
    let package = service.create(&shopee_for(&ana)).unwrap().package;
    ResidentService::new(&repo).delete(&ana.id).unwrap();

    assert!(matches!(
        service.notify(&package.id),
        Err(PortariaError::ResidentNotFound(id)) if id == ana.id
    ));
    assert!(matches!(
        service.notify(&PackageId::from("missing")),
        Err(PortariaError::PackageNotFound(_))
    ));
}
