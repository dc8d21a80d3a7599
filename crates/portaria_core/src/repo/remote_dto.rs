//! Wire shapes for the REST collaborator.
//!
//! The server speaks Portuguese field names (`moradores`, `encomendas`);
//! these types keep that vocabulary at the edge and convert into domain
//! records. Timestamps travel as RFC 3339 strings; older records may carry
//! naive or day-first local renderings, and anything unreadable degrades to
//! a missing value instead of failing the whole collection.

use crate::model::package::{NewPackage, Package, PackagePatch};
use crate::model::record_id::RecordId;
use crate::model::resident::{NewResident, Resident, ResidentPatch};
use crate::repo::{RepoError, RepoResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y, %H:%M:%S",
    "%d/%m/%Y %H:%M",
];
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResidentDto {
    pub id: RecordId,
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub sobrenome: Option<String>,
    #[serde(default)]
    pub bloco: Option<String>,
    #[serde(default)]
    pub apartamento: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
}

impl ResidentDto {
    pub fn into_domain(self) -> Resident {
        Resident {
            id: self.id,
            first_name: self.nome.unwrap_or_default(),
            last_name: self.sobrenome.unwrap_or_default(),
            block: self.bloco.unwrap_or_default(),
            unit: self.apartamento.unwrap_or_default(),
            phone: self.telefone.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NewResidentBody<'a> {
    pub nome: &'a str,
    pub sobrenome: &'a str,
    pub bloco: &'a str,
    pub apartamento: &'a str,
    pub telefone: &'a str,
}

impl<'a> From<&'a NewResident> for NewResidentBody<'a> {
    fn from(value: &'a NewResident) -> Self {
        Self {
            nome: &value.first_name,
            sobrenome: &value.last_name,
            bloco: &value.block,
            apartamento: &value.unit,
            telefone: &value.phone,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResidentPatchBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sobrenome: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bloco: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apartamento: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone: Option<&'a str>,
}

impl<'a> From<&'a ResidentPatch> for ResidentPatchBody<'a> {
    fn from(value: &'a ResidentPatch) -> Self {
        Self {
            nome: value.first_name.as_deref(),
            sobrenome: value.last_name.as_deref(),
            bloco: value.block.as_deref(),
            apartamento: value.unit.as_deref(),
            telefone: value.phone.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PackageDto {
    pub id: RecordId,
    #[serde(default)]
    pub morador_id: Option<RecordId>,
    #[serde(default)]
    pub morador: Option<ResidentDto>,
    #[serde(default)]
    pub origem: Option<String>,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, alias = "dataRecebimento")]
    pub data_registro: Option<String>,
    #[serde(default)]
    pub retirada: Option<bool>,
    #[serde(default)]
    pub retirada_em: Option<String>,
}

impl PackageDto {
    /// Converts into a domain record.
    ///
    /// An unreadable `dataRegistro` falls back to `0`; an unreadable
    /// `retiradaEm` still marks the package as collected, without a time.
    pub fn into_domain(self) -> Package {
        let resident = self.morador.map(ResidentDto::into_domain);
        let resident_id = self
            .morador_id
            .or_else(|| resident.as_ref().map(|resident| resident.id.clone()));
        let received_at =
            lenient_timestamp(&self.id, "dataRegistro", self.data_registro.as_deref())
                .unwrap_or_default();
        let pickup_stamped = self
            .retirada_em
            .as_deref()
            .is_some_and(|raw| !raw.trim().is_empty());
        let picked_up_at = lenient_timestamp(&self.id, "retiradaEm", self.retirada_em.as_deref());

        Package {
            id: self.id,
            resident_id,
            resident,
            origin: self.origem.unwrap_or_default(),
            description: self.descricao.filter(|value| !value.trim().is_empty()),
            token: self.token.unwrap_or_default(),
            received_at,
            picked_up: self.retirada.unwrap_or(false) || pickup_stamped,
            picked_up_at,
        }
    }
}

fn lenient_timestamp(id: &RecordId, field: &'static str, raw: Option<&str>) -> Option<i64> {
    let raw = raw.filter(|value| !value.trim().is_empty())?;
    match parse_timestamp(raw) {
        Ok(epoch_ms) => Some(epoch_ms),
        Err(_) => {
            warn!(
                "event=remote_decode module=remote status=degraded package_id={id} field={field}"
            );
            None
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewPackageBody<'a> {
    pub morador_id: &'a RecordId,
    pub origem: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descricao: Option<&'a str>,
}

impl<'a> From<&'a NewPackage> for NewPackageBody<'a> {
    fn from(value: &'a NewPackage) -> Self {
        Self {
            morador_id: &value.resident_id,
            origem: &value.origin,
            descricao: value.description.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PackagePatchBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morador_id: Option<&'a RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origem: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descricao: Option<&'a str>,
}

impl<'a> From<&'a PackagePatch> for PackagePatchBody<'a> {
    fn from(value: &'a PackagePatch) -> Self {
        Self {
            morador_id: value.resident_id.as_ref(),
            origem: value.origin.as_deref(),
            descricao: value.description.as_deref(),
        }
    }
}

/// Pickup event body for `POST /retiradas`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PickupBody<'a> {
    pub morador_name: String,
    pub encomenda_token: &'a str,
}

/// Pickup-field update used when the server does not flag the package
/// itself after a pickup event.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PickupPatchBody {
    pub retirada: bool,
    pub retirada_em: String,
}

/// Parses RFC 3339, or a naive ISO / day-first date(-time) read as UTC.
///
/// Date-only values resolve to midnight.
pub(crate) fn parse_timestamp(raw: &str) -> RepoResult<i64> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.timestamp_millis());
    }
    let naive = NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            NAIVE_DATE_FORMATS.iter().find_map(|format| {
                NaiveDate::parse_from_str(trimmed, format)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
        });
    naive
        .map(|naive| naive.and_utc().timestamp_millis())
        .ok_or_else(|| RepoError::InvalidData(format!("unparseable timestamp `{trimmed}`")))
}

pub(crate) fn format_timestamp(epoch_ms: i64) -> RepoResult<String> {
    Utc.timestamp_millis_opt(epoch_ms)
        .single()
        .map(|instant| instant.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| RepoError::InvalidData(format!("timestamp {epoch_ms} out of range")))
}
