//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose registry, ledger and validator use-cases to Dart via FRB.
//! - Flatten core errors into envelopes with a stable `error_code`.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Functions touching storage or network are exported without
//!   `frb(sync)` so the shell runs them off the UI thread.
//! - `error_code` is one of `validation|capacity|not_found|
//!   already_processed|transport` when `ok` is false.

use log::warn;
use once_cell::sync::OnceCell;
use portaria_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Backend, BackendError, DeskSummary, FrontDeskRepository, NewPackage, NewResident, Package,
    PackagePatch, PackageService, PickupService, PortariaConfig, PortariaError, RecordId,
    Resident, ResidentPatch, ResidentService, SummaryService, UnitOccupancy,
    DEFAULT_RECENT_LIMIT,
};

const RECENT_LIMIT_MAX: u32 = 50;
const TRANSPORT_CODE: &str = "transport";
static FFI_CONFIG: OnceCell<PortariaConfig> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Resident row for list and form screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidentItem {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub block: String,
    pub unit: String,
    pub phone: String,
}

/// Package row for list, dashboard and validation screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageItem {
    pub id: String,
    pub resident_id: Option<String>,
    /// Resident full name, or `—` when the resident was deleted.
    pub resident_name: String,
    pub block: Option<String>,
    pub unit: Option<String>,
    pub origin: String,
    pub description: Option<String>,
    pub token: String,
    pub received_at_ms: i64,
    pub picked_up: bool,
    pub picked_up_at_ms: Option<i64>,
}

/// Occupancy of one (block, unit) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOccupancyItem {
    pub block: String,
    pub unit: String,
    pub count: u32,
    pub limit: u32,
    pub residents: Vec<ResidentItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidentListResponse {
    pub ok: bool,
    pub items: Vec<ResidentItem>,
    pub message: String,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyResponse {
    pub ok: bool,
    pub units: Vec<UnitOccupancyItem>,
    pub message: String,
    pub error_code: Option<String>,
}

/// Generic action response envelope for resident commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidentActionResponse {
    pub ok: bool,
    /// Affected resident; `None` on failure and on delete.
    pub resident: Option<ResidentItem>,
    pub message: String,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageListResponse {
    pub ok: bool,
    pub items: Vec<PackageItem>,
    pub message: String,
    pub error_code: Option<String>,
}

/// Generic action response envelope for package commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageActionResponse {
    pub ok: bool,
    pub package: Option<PackageItem>,
    /// Messaging deep link, set by a successful create or notify.
    pub notify_link: Option<String>,
    /// Original pickup time when `error_code` is `already_processed`.
    pub picked_up_at_ms: Option<i64>,
    pub message: String,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskSummaryResponse {
    pub ok: bool,
    pub resident_count: u32,
    pub package_count: u32,
    pub picked_up_count: u32,
    pub pending_count: u32,
    pub recent_packages: Vec<PackageItem>,
    pub message: String,
    pub error_code: Option<String>,
}

/// Failure flattened for envelopes.
#[derive(Debug)]
struct FfiFailure {
    code: &'static str,
    message: String,
    picked_up_at_ms: Option<i64>,
}

impl From<PortariaError> for FfiFailure {
    fn from(err: PortariaError) -> Self {
        let picked_up_at_ms = match &err {
            PortariaError::AlreadyProcessed { picked_up_at } => Some(*picked_up_at),
            _ => None,
        };
        Self {
            code: err.code(),
            message: err.to_string(),
            picked_up_at_ms,
        }
    }
}

impl From<BackendError> for FfiFailure {
    fn from(err: BackendError) -> Self {
        Self {
            code: TRANSPORT_CODE,
            message: format!("backend unavailable: {err}"),
            picked_up_at_ms: None,
        }
    }
}

/// Lists all residents.
pub fn resident_list() -> ResidentListResponse {
    resident_list_response(
        "resident_list",
        with_repo("resident_list", |repo| ResidentService::new(repo).list()),
    )
}

/// Filters residents by name, block or unit. Blank query lists everyone.
pub fn resident_search(query: String) -> ResidentListResponse {
    resident_list_response(
        "resident_search",
        with_repo("resident_search", |repo| {
            ResidentService::new(repo).search(&query)
        }),
    )
}

/// Groups residents by (block, unit) for the registry screen.
pub fn resident_occupancy() -> OccupancyResponse {
    match with_repo("resident_occupancy", |repo| {
        ResidentService::new(repo).occupancy()
    }) {
        Ok(groups) => OccupancyResponse {
            ok: true,
            message: format!("{} unit(s).", groups.len()),
            units: groups.into_iter().map(to_occupancy_item).collect(),
            error_code: None,
        },
        Err(failure) => OccupancyResponse {
            ok: false,
            units: Vec::new(),
            message: format!("resident_occupancy failed: {}", failure.message),
            error_code: Some(failure.code.to_string()),
        },
    }
}

/// Registers a resident. Fails with `capacity` when the unit is full.
pub fn resident_create(
    first_name: String,
    last_name: String,
    block: String,
    unit: String,
    phone: String,
) -> ResidentActionResponse {
    let input = NewResident {
        first_name,
        last_name,
        block,
        unit,
        phone,
    };
    resident_action_response(
        "resident_create",
        "Resident created.",
        with_repo("resident_create", |repo| {
            ResidentService::new(repo).create(&input).map(Some)
        }),
    )
}

/// Merges supplied fields into a resident. `None` keeps the stored value.
pub fn resident_update(
    id: String,
    first_name: Option<String>,
    last_name: Option<String>,
    block: Option<String>,
    unit: Option<String>,
    phone: Option<String>,
) -> ResidentActionResponse {
    let patch = ResidentPatch {
        first_name,
        last_name,
        block,
        unit,
        phone,
    };
    let id = RecordId::from(id);
    resident_action_response(
        "resident_update",
        "Resident updated.",
        with_repo("resident_update", |repo| {
            ResidentService::new(repo).update(&id, &patch).map(Some)
        }),
    )
}

/// Deletes a resident. Their packages stay listed without a resident.
pub fn resident_delete(id: String) -> ResidentActionResponse {
    let id = RecordId::from(id);
    resident_action_response(
        "resident_delete",
        "Resident deleted.",
        with_repo("resident_delete", |repo| {
            ResidentService::new(repo).delete(&id).map(|()| None)
        }),
    )
}

/// Lists all packages with resident names where resolvable.
pub fn package_list() -> PackageListResponse {
    match with_repo("package_list", |repo| PackageService::new(repo).list()) {
        Ok(packages) => PackageListResponse {
            ok: true,
            message: format!("{} package(s).", packages.len()),
            items: packages.iter().map(to_package_item).collect(),
            error_code: None,
        },
        Err(failure) => PackageListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("package_list failed: {}", failure.message),
            error_code: Some(failure.code.to_string()),
        },
    }
}

/// Registers a package and returns its token plus the arrival link.
pub fn package_create(
    resident_id: String,
    origin: String,
    description: Option<String>,
) -> PackageActionResponse {
    let input = NewPackage {
        resident_id: RecordId::from(resident_id),
        origin,
        description,
    };
    match with_repo("package_create", |repo| {
        PackageService::new(repo).create(&input)
    }) {
        Ok(registered) => PackageActionResponse {
            ok: true,
            package: Some(to_package_item(&registered.package)),
            notify_link: registered.notification.map(|notice| notice.link),
            picked_up_at_ms: None,
            message: "Package registered.".to_string(),
            error_code: None,
        },
        Err(failure) => package_failure("package_create", failure),
    }
}

/// Edits resident, origin or description. Pickup fields are not editable.
pub fn package_update(
    id: String,
    resident_id: Option<String>,
    origin: Option<String>,
    description: Option<String>,
) -> PackageActionResponse {
    let id = RecordId::from(id);
    let patch = PackagePatch {
        resident_id: resident_id.map(RecordId::from),
        origin,
        description,
    };
    package_action_response(
        "package_update",
        "Package updated.",
        with_repo("package_update", |repo| {
            PackageService::new(repo).update(&id, &patch).map(Some)
        }),
    )
}

pub fn package_delete(id: String) -> PackageActionResponse {
    let id = RecordId::from(id);
    package_action_response(
        "package_delete",
        "Package deleted.",
        with_repo("package_delete", |repo| {
            PackageService::new(repo).delete(&id).map(|()| None)
        }),
    )
}

/// Builds the pickup reminder link for a listed package.
///
/// # FFI contract
/// - `notify_link` is set when `ok` is true; the shell opens it.
/// - A resident without phone digits yields `validation`; a deleted
///   resident yields `not_found`.
pub fn package_notify(id: String) -> PackageActionResponse {
    let id = RecordId::from(id);
    match with_repo("package_notify", |repo| {
        let service = PackageService::new(repo);
        let package = service.get(&id)?;
        let reminder = service.notify(&id)?;
        Ok((package, reminder))
    }) {
        Ok((package, reminder)) => PackageActionResponse {
            ok: true,
            package: Some(to_package_item(&package)),
            notify_link: Some(reminder.link),
            picked_up_at_ms: None,
            message: "Reminder ready.".to_string(),
            error_code: None,
        },
        Err(failure) => package_failure("package_notify", failure),
    }
}

/// Redeems a pickup token.
///
/// # FFI contract
/// - `ok=true` exactly once per token.
/// - A repeated token yields `already_processed` with `picked_up_at_ms`.
pub fn package_validate(token: String) -> PackageActionResponse {
    package_action_response(
        "package_validate",
        "Package delivered.",
        with_repo("package_validate", |repo| {
            PickupService::new(repo).validate(&token).map(Some)
        }),
    )
}

/// Dashboard counters plus the most recent packages.
///
/// `recent_limit`: `None` or `0` uses the default; capped at 50.
pub fn desk_summary(recent_limit: Option<u32>) -> DeskSummaryResponse {
    let limit = normalize_recent_limit(recent_limit);
    match with_repo("desk_summary", |repo| {
        SummaryService::new(repo).summary(limit)
    }) {
        Ok(summary) => to_summary_response(&summary),
        Err(failure) => DeskSummaryResponse {
            ok: false,
            resident_count: 0,
            package_count: 0,
            picked_up_count: 0,
            pending_count: 0,
            recent_packages: Vec::new(),
            message: format!("desk_summary failed: {}", failure.message),
            error_code: Some(failure.code.to_string()),
        },
    }
}

fn normalize_recent_limit(limit: Option<u32>) -> usize {
    match limit {
        None | Some(0) => DEFAULT_RECENT_LIMIT,
        Some(value) => value.min(RECENT_LIMIT_MAX) as usize,
    }
}

fn resolve_config() -> Result<&'static PortariaConfig, FfiFailure> {
    FFI_CONFIG
        .get_or_try_init(PortariaConfig::from_env)
        .map_err(|err| FfiFailure {
            code: TRANSPORT_CODE,
            message: format!("invalid configuration: {err}"),
            picked_up_at_ms: None,
        })
}

fn with_repo<T>(
    op: &'static str,
    f: impl FnOnce(&dyn FrontDeskRepository) -> Result<T, PortariaError>,
) -> Result<T, FfiFailure> {
    let result = resolve_config().and_then(|config| {
        let backend = Backend::open(&config.backend)?;
        let repo = backend.repository()?;
        let outcome = f(repo.as_dyn());
        outcome.map_err(FfiFailure::from)
    });
    if let Err(failure) = &result {
        warn!(
            "event=ffi_call module=ffi status=error op={} code={}",
            op, failure.code
        );
    }
    result
}

fn resident_list_response(
    op: &str,
    result: Result<Vec<Resident>, FfiFailure>,
) -> ResidentListResponse {
    match result {
        Ok(residents) => ResidentListResponse {
            ok: true,
            message: format!("{} resident(s).", residents.len()),
            items: residents.iter().map(to_resident_item).collect(),
            error_code: None,
        },
        Err(failure) => ResidentListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("{op} failed: {}", failure.message),
            error_code: Some(failure.code.to_string()),
        },
    }
}

fn resident_action_response(
    op: &str,
    success: &str,
    result: Result<Option<Resident>, FfiFailure>,
) -> ResidentActionResponse {
    match result {
        Ok(resident) => ResidentActionResponse {
            ok: true,
            resident: resident.as_ref().map(to_resident_item),
            message: success.to_string(),
            error_code: None,
        },
        Err(failure) => ResidentActionResponse {
            ok: false,
            resident: None,
            message: format!("{op} failed: {}", failure.message),
            error_code: Some(failure.code.to_string()),
        },
    }
}

fn package_action_response(
    op: &str,
    success: &str,
    result: Result<Option<Package>, FfiFailure>,
) -> PackageActionResponse {
    match result {
        Ok(package) => PackageActionResponse {
            ok: true,
            package: package.as_ref().map(to_package_item),
            notify_link: None,
            picked_up_at_ms: None,
            message: success.to_string(),
            error_code: None,
        },
        Err(failure) => package_failure(op, failure),
    }
}

fn package_failure(op: &str, failure: FfiFailure) -> PackageActionResponse {
    PackageActionResponse {
        ok: false,
        package: None,
        notify_link: None,
        picked_up_at_ms: failure.picked_up_at_ms,
        message: format!("{op} failed: {}", failure.message),
        error_code: Some(failure.code.to_string()),
    }
}

fn to_summary_response(summary: &DeskSummary) -> DeskSummaryResponse {
    DeskSummaryResponse {
        ok: true,
        resident_count: saturating_u32(summary.resident_count),
        package_count: saturating_u32(summary.package_count),
        picked_up_count: saturating_u32(summary.picked_up_count),
        pending_count: saturating_u32(summary.pending_count()),
        recent_packages: summary.recent_packages.iter().map(to_package_item).collect(),
        message: "Summary ready.".to_string(),
        error_code: None,
    }
}

fn to_resident_item(resident: &Resident) -> ResidentItem {
    ResidentItem {
        id: resident.id.to_string(),
        first_name: resident.first_name.clone(),
        last_name: resident.last_name.clone(),
        block: resident.block.clone(),
        unit: resident.unit.clone(),
        phone: resident.phone.clone(),
    }
}

fn to_package_item(package: &Package) -> PackageItem {
    PackageItem {
        id: package.id.to_string(),
        resident_id: package.resident_id.as_ref().map(ToString::to_string),
        resident_name: package.resident_label(),
        block: package.resident.as_ref().map(|r| r.block.clone()),
        unit: package.resident.as_ref().map(|r| r.unit.clone()),
        origin: package.origin.clone(),
        description: package.description.clone(),
        token: package.token.clone(),
        received_at_ms: package.received_at,
        picked_up: package.picked_up,
        picked_up_at_ms: package.picked_up_at,
    }
}

fn to_occupancy_item(group: UnitOccupancy) -> UnitOccupancyItem {
    UnitOccupancyItem {
        count: saturating_u32(group.count()),
        limit: saturating_u32(group.limit),
        residents: group.residents.iter().map(to_resident_item).collect(),
        block: group.block,
        unit: group.unit,
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, desk_summary, init_logging, normalize_recent_limit, package_create,
        package_delete, package_list, package_notify, package_update, package_validate, ping,
        resident_create,
        resident_delete, resident_list, resident_occupancy, resident_search, resident_update,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn recent_limit_defaults_and_caps() {
        assert_eq!(normalize_recent_limit(None), 5);
        assert_eq!(normalize_recent_limit(Some(0)), 5);
        assert_eq!(normalize_recent_limit(Some(3)), 3);
        assert_eq!(normalize_recent_limit(Some(500)), 50);
    }

    #[test]
    fn resident_create_enforces_unit_capacity() {
        let block = unique_label("cap");
        for name in ["Ana", "Bruno", "Carla"] {
            let created = resident_create(
                name.to_string(),
                "Silva".to_string(),
                block.clone(),
                "101".to_string(),
                "11 98888-7777".to_string(),
            );
            assert!(created.ok, "{}", created.message);
        }

        let rejected = resident_create(
            "Diego".to_string(),
            "Silva".to_string(),
            block.clone(),
            "101".to_string(),
            "11 98888-7777".to_string(),
        );
        assert!(!rejected.ok);
        assert_eq!(rejected.error_code.as_deref(), Some("capacity"));

        let listed = resident_search(block.clone());
        assert!(listed.ok, "{}", listed.message);
        assert_eq!(listed.items.len(), 3);

        let occupancy = resident_occupancy();
        assert!(occupancy.ok, "{}", occupancy.message);
        let unit = occupancy
            .units
            .iter()
            .find(|unit| unit.block == block)
            .expect("seeded unit should be grouped");
        assert_eq!((unit.count, unit.limit), (3, 3));
    }

    #[test]
    fn resident_create_reports_validation_code() {
        let response = resident_create(
            "Ana".to_string(),
            " ".to_string(),
            unique_label("val"),
            "101".to_string(),
            "11 98888-7777".to_string(),
        );
        assert!(!response.ok);
        assert_eq!(response.error_code.as_deref(), Some("validation"));
    }

    #[test]
    fn resident_update_and_delete_round_through_envelopes() {
        let block = unique_label("upd");
        let created = resident_create(
            "Ana".to_string(),
            "Silva".to_string(),
            block.clone(),
            "101".to_string(),
            "11 98888-7777".to_string(),
        );
        let id = created.resident.expect("created resident").id;

        let updated = resident_update(
            id.clone(),
            None,
            Some("Souza".to_string()),
            None,
            None,
            None,
        );
        assert!(updated.ok, "{}", updated.message);
        assert_eq!(updated.resident.expect("updated resident").last_name, "Souza");

        assert!(resident_delete(id.clone()).ok);
        let missing = resident_delete(id);
        assert_eq!(missing.error_code.as_deref(), Some("not_found"));
        assert!(resident_list().ok);
    }

    #[test]
    fn package_validate_succeeds_once() {
        let created = resident_create(
            "Ana".to_string(),
            "Silva".to_string(),
            unique_label("pkg"),
            "101".to_string(),
            "11 98888-7777".to_string(),
        );
        let resident_id = created.resident.expect("created resident").id;

        let registered = package_create(resident_id, "Shopee".to_string(), None);
        assert!(registered.ok, "{}", registered.message);
        assert!(registered
            .notify_link
            .as_deref()
            .is_some_and(|link| link.starts_with("https://wa.me/55")));
        let package = registered.package.expect("registered package");
        assert_eq!(package.resident_name, "Ana Silva");

        let first = package_validate(package.token.clone());
        assert!(first.ok, "{}", first.message);
        let picked_at = first
            .package
            .and_then(|item| item.picked_up_at_ms)
            .expect("pickup time");

        let second = package_validate(package.token);
        assert!(!second.ok);
        assert_eq!(second.error_code.as_deref(), Some("already_processed"));
        assert_eq!(second.picked_up_at_ms, Some(picked_at));

        assert!(package_list()
            .items
            .iter()
            .any(|item| item.id == package.id && item.picked_up));
        assert!(desk_summary(None).ok);
    }

    #[test]
    fn package_update_and_delete_report_codes() {
        let created = resident_create(
            "Bruno".to_string(),
            "Costa".to_string(),
            unique_label("edit"),
            "202".to_string(),
            "11 97777-6666".to_string(),
        );
        let resident_id = created.resident.expect("created resident").id;
        let package = package_create(resident_id, "Amazon".to_string(), None)
            .package
            .expect("registered package");

        let updated = package_update(
            package.id.clone(),
            None,
            Some("Correios".to_string()),
            Some("envelope".to_string()),
        );
        assert!(updated.ok, "{}", updated.message);
        let item = updated.package.expect("updated package");
        assert_eq!(item.origin, "Correios");
        assert_eq!(item.token, package.token);

        let ghost = package_update(
            package.id.clone(),
            Some("ghost-resident".to_string()),
            None,
            None,
        );
        assert_eq!(ghost.error_code.as_deref(), Some("not_found"));

        assert!(package_delete(package.id.clone()).ok);
        assert!(!package_list().items.iter().any(|item| item.id == package.id));
        let missing = package_delete(package.id);
        assert_eq!(missing.error_code.as_deref(), Some("not_found"));
    }

    #[test]
    fn package_notify_returns_reminder_link_or_code() {
        let with_phone = resident_create(
            "Carla".to_string(),
            "Souza".to_string(),
            unique_label("ntf"),
            "303".to_string(),
            "11 96666-5555".to_string(),
        )
        .resident
        .expect("created resident");
        let package = package_create(with_phone.id, "Correios".to_string(), None)
            .package
            .expect("registered package");

        let reminder = package_notify(package.id.clone());
        assert!(reminder.ok, "{}", reminder.message);
        assert!(reminder
            .notify_link
            .as_deref()
            .is_some_and(|link| link.starts_with("https://wa.me/5511966665555?text=")));
        assert_eq!(reminder.package.expect("notified package").id, package.id);

        let without_phone = resident_create(
            "Diego".to_string(),
            "Lima".to_string(),
            unique_label("ntf"),
            "304".to_string(),
            "sem telefone".to_string(),
        )
        .resident
        .expect("created resident");
        let silent = package_create(without_phone.id, "Amazon".to_string(), None)
            .package
            .expect("registered package");

        let rejected = package_notify(silent.id);
        assert!(!rejected.ok);
        assert_eq!(rejected.notify_link, None);
        assert_eq!(rejected.error_code.as_deref(), Some("validation"));
    }

    fn unique_label(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
