//! Remote-service backend: thin blocking client for the REST collaborator.
//!
//! # Responsibility
//! - Map repository calls onto `/moradores`, `/encomendas` and `/retiradas`.
//! - Convert non-2xx responses into errors carrying the server's message.
//!
//! # Invariants
//! - Token issuance and id assignment belong to the server.
//! - Every request is bounded by the configured timeout.
//! - No retries; a failure is surfaced once.

use crate::model::package::{NewPackage, Package, PackageId, PackagePatch};
use crate::model::record_id::RecordId;
use crate::model::resident::{NewResident, Resident, ResidentId, ResidentPatch};
use crate::model::token::redact_token;
use crate::repo::remote_dto::{
    format_timestamp, NewPackageBody, NewResidentBody, PackageDto, PackagePatchBody, PickupBody,
    PickupPatchBody, ResidentDto, ResidentPatchBody,
};
use crate::repo::{PackageRepository, RepoError, RepoResult, ResidentRepository};
use log::{info, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

const RESIDENTS_PATH: &str = "moradores";
const PACKAGES_PATH: &str = "encomendas";
const PICKUPS_PATH: &str = "retiradas";
const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// REST-backed front-desk repository.
pub struct RemoteRepository {
    client: Client,
    base_url: Url,
}

impl RemoteRepository {
    /// Builds a client with an explicit per-request timeout.
    ///
    /// # Errors
    /// - Returns an error when the HTTP client cannot be constructed.
    /// - Returns `InvalidData` when `base_url` cannot carry path segments.
    pub fn new(base_url: Url, timeout: Duration) -> RepoResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(RepoError::InvalidData(format!(
                "base url `{base_url}` cannot carry endpoint paths"
            )));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> RepoResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                RepoError::InvalidData(format!(
                    "base url `{}` cannot carry endpoint paths",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn send(&self, request: RequestBuilder, route: &'static str) -> RepoResult<Response> {
        let response = request.send().map_err(|err| {
            warn!("event=http_request module=remote status=error route={route} error={err}");
            RepoError::Http(err)
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(status, response);
        warn!(
            "event=http_request module=remote status=error route={route} http_status={}",
            status.as_u16()
        );
        Err(RepoError::Status {
            status: status.as_u16(),
            message,
        })
    }

    fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        route: &'static str,
    ) -> RepoResult<T> {
        Ok(self.send(request, route)?.json::<T>()?)
    }

    fn package_by_token(&self, token: &str) -> RepoResult<Option<Package>> {
        let url = self.endpoint(&[PACKAGES_PATH, "token", token])?;
        match self.fetch_json::<PackageDto>(self.client.get(url), "encomendas_by_token") {
            Ok(dto) => Ok(Some(dto.into_domain())),
            Err(RepoError::Status { status, .. }) if (400..500).contains(&status) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl ResidentRepository for RemoteRepository {
    fn list_residents(&self) -> RepoResult<Vec<Resident>> {
        let url = self.endpoint(&[RESIDENTS_PATH])?;
        let dtos: Vec<ResidentDto> = self.fetch_json(self.client.get(url), "moradores_list")?;
        Ok(dtos.into_iter().map(ResidentDto::into_domain).collect())
    }

    fn get_resident(&self, id: &ResidentId) -> RepoResult<Option<Resident>> {
        Ok(self
            .list_residents()?
            .into_iter()
            .find(|resident| &resident.id == id))
    }

    fn create_resident(&self, input: &NewResident) -> RepoResult<Resident> {
        let url = self.endpoint(&[RESIDENTS_PATH])?;
        let body = NewResidentBody::from(input);
        let dto: ResidentDto =
            self.fetch_json(self.client.post(url).json(&body), "moradores_create")?;
        Ok(dto.into_domain())
    }

    fn update_resident(&self, id: &ResidentId, patch: &ResidentPatch) -> RepoResult<Resident> {
        let url = self.endpoint(&[RESIDENTS_PATH, id.as_str()])?;
        let body = ResidentPatchBody::from(patch);
        let dto: ResidentDto = self
            .fetch_json(self.client.put(url).json(&body), "moradores_update")
            .map_err(|err| not_found_for(err, id))?;
        Ok(dto.into_domain())
    }

    fn delete_resident(&self, id: &ResidentId) -> RepoResult<()> {
        let url = self.endpoint(&[RESIDENTS_PATH, id.as_str()])?;
        self.send(self.client.delete(url), "moradores_delete")
            .map_err(|err| not_found_for(err, id))?;
        Ok(())
    }
}

impl PackageRepository for RemoteRepository {
    fn list_packages(&self) -> RepoResult<Vec<Package>> {
        let url = self.endpoint(&[PACKAGES_PATH])?;
        let dtos: Vec<PackageDto> = self.fetch_json(self.client.get(url), "encomendas_list")?;
        Ok(dtos.into_iter().map(PackageDto::into_domain).collect())
    }

    fn get_package(&self, id: &PackageId) -> RepoResult<Option<Package>> {
        Ok(self
            .list_packages()?
            .into_iter()
            .find(|package| &package.id == id))
    }

    fn create_package(&self, input: &NewPackage) -> RepoResult<Package> {
        let url = self.endpoint(&[PACKAGES_PATH])?;
        let body = NewPackageBody::from(input);
        let dto: PackageDto =
            self.fetch_json(self.client.post(url).json(&body), "encomendas_create")?;
        Ok(dto.into_domain())
    }

    fn update_package(&self, id: &PackageId, patch: &PackagePatch) -> RepoResult<Package> {
        let url = self.endpoint(&[PACKAGES_PATH, id.as_str()])?;
        let body = PackagePatchBody::from(patch);
        let dto: PackageDto = self
            .fetch_json(self.client.put(url).json(&body), "encomendas_update")
            .map_err(|err| not_found_for(err, id))?;
        Ok(dto.into_domain())
    }

    fn delete_package(&self, id: &PackageId) -> RepoResult<()> {
        let url = self.endpoint(&[PACKAGES_PATH, id.as_str()])?;
        self.send(self.client.delete(url), "encomendas_delete")
            .map_err(|err| not_found_for(err, id))?;
        Ok(())
    }

    fn find_by_token(&self, token: &str) -> RepoResult<Option<Package>> {
        self.package_by_token(token)
    }

    fn mark_picked_up(&self, package: &Package, picked_up_at: i64) -> RepoResult<Package> {
        let url = self.endpoint(&[PICKUPS_PATH])?;
        let body = PickupBody {
            morador_name: package
                .resident
                .as_ref()
                .map(Resident::full_name)
                .unwrap_or_default(),
            encomenda_token: &package.token,
        };
        self.send(self.client.post(url).json(&body), "retiradas_create")?;
        info!(
            "event=pickup_record module=remote status=ok token={}",
            redact_token(&package.token)
        );

        match self.package_by_token(&package.token)? {
            Some(stored) if stored.picked_up => Ok(stored),
            Some(stored) => {
                let url = self.endpoint(&[PACKAGES_PATH, stored.id.as_str()])?;
                let body = PickupPatchBody {
                    retirada: true,
                    retirada_em: format_timestamp(picked_up_at)?,
                };
                let dto: PackageDto =
                    self.fetch_json(self.client.put(url).json(&body), "encomendas_pickup")?;
                Ok(dto.into_domain())
            }
            None => Err(RepoError::NotFound(package.id.clone())),
        }
    }
}

fn not_found_for(err: RepoError, id: &RecordId) -> RepoError {
    match err {
        RepoError::Status { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => {
            RepoError::NotFound(id.clone())
        }
        other => other,
    }
}

/// Extracts the best available server message from an error response.
///
/// Prefers a JSON `message`/`error` field, then the raw body, then the
/// canonical status reason.
fn error_message(status: StatusCode, response: Response) -> String {
    let body = response.text().unwrap_or_default();
    let from_json = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            ["message", "error", "mensagem"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        });
    let message = from_json.unwrap_or_else(|| body.trim().to_string());
    if message.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }
    message.chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
}
