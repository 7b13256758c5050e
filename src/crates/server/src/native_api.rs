use super::error::ApiError;
use super::AppState;
use actix_web::{web, web::Json, web::Query, HttpResponse};
use domain::media_item::{MediaItem, MediaItemFilter};
use domain::performer::{Performer, PerformerFilter};
use domain::value::{MediaItemId, PerformerId, PlayKey, PlayPeriod};
use domain::DomainError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PerformerDto {
    pub id: String,
    pub name: String,
}

impl From<Performer> for PerformerDto {
    fn from(p: Performer) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MediaItemDto {
    pub id: String,
    pub title: String,
    pub owner_id: String,
    pub play_count: i64,
}

impl From<MediaItem> for MediaItemDto {
    fn from(m: MediaItem) -> Self {
        Self {
            id: m.id.to_string(),
            title: m.title,
            owner_id: m.owner_id.to_string(),
            play_count: m.play_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PerformerQuery {
    /// 逗号分隔的ID列表
    pub id: Option<String>,
    pub name: Option<String>,
    pub from_id: Option<String>,
}

impl PerformerQuery {
    fn into_filter(self) -> Result<PerformerFilter, DomainError> {
        Ok(PerformerFilter {
            ids: parse_id_list(self.id.as_deref())?,
            name: self.name,
            from_id: parse_optional_id(self.from_id.as_deref())?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct MediaItemQuery {
    pub id: Option<String>,
    pub title: Option<String>,
    pub from_id: Option<String>,
}

impl MediaItemQuery {
    fn into_filter(self) -> Result<MediaItemFilter, DomainError> {
        Ok(MediaItemFilter {
            ids: parse_id_list(self.id.as_deref())?,
            title: self.title,
            from_id: parse_optional_id(self.from_id.as_deref())?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePerformerRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateMediaItemRequest {
    pub title: String,
    pub owner_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordPlayRequest {
    pub media_item_id: String,
    pub performer_id: String,
    pub month: Option<u32>,
    pub year: Option<u32>,
}

impl RecordPlayRequest {
    fn into_key(self) -> Result<PlayKey, ApiError> {
        let period = match (self.month, self.year) {
            (Some(month), Some(year)) => PlayPeriod::new(month, year)?,
            (None, None) => PlayPeriod::current(),
            _ => {
                return Err(ApiError::BadRequest(
                    "month and year must be given together".to_string(),
                ))
            }
        };
        Ok(PlayKey::new(
            MediaItemId::from_str(&self.media_item_id)?,
            PerformerId::from_str(&self.performer_id)?,
            period,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct MonthlyPlaysQuery {
    pub performer_id: String,
    pub month: u32,
    pub year: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MonthlyPlaysDto {
    pub performer_id: String,
    pub month: u8,
    pub year: u32,
    /// `None` 表示该月从未记录过播放
    pub total_plays: Option<i64>,
}

fn parse_id_list<T>(raw: Option<&str>) -> Result<Vec<T>, DomainError>
where
    T: FromStr<Err = DomainError>,
{
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(T::from_str)
        .collect()
}

fn parse_optional_id<T>(raw: Option<&str>) -> Result<Option<T>, DomainError>
where
    T: FromStr<Err = DomainError>,
{
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(T::from_str)
        .transpose()
}

fn non_blank(field: &str, value: String) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

async fn list_performers(
    state: web::Data<AppState>,
    Query(query): Query<PerformerQuery>,
) -> Result<Json<Vec<PerformerDto>>, ApiError> {
    let filter = query.into_filter()?;
    let performers = state
        .repo
        .list_performers(&state.unit_of_work(), &filter)
        .await?;
    Ok(Json(performers.into_iter().map(PerformerDto::from).collect()))
}

async fn create_performer(
    state: web::Data<AppState>,
    Json(req): Json<CreatePerformerRequest>,
) -> Result<HttpResponse, ApiError> {
    let name = non_blank("name", req.name)?;
    let id = state.id_generator.next_id().await?;
    let performer = Performer::new(PerformerId::from(id), name);
    state
        .repo
        .create_performer(&state.unit_of_work(), &performer)
        .await?;
    info!("performer {} created", performer.id);
    Ok(HttpResponse::Created().json(PerformerDto::from(performer)))
}

async fn list_media_items(
    state: web::Data<AppState>,
    Query(query): Query<MediaItemQuery>,
) -> Result<Json<Vec<MediaItemDto>>, ApiError> {
    let filter = query.into_filter()?;
    let items = state
        .repo
        .list_media_items(&state.unit_of_work(), &filter)
        .await?;
    Ok(Json(items.into_iter().map(MediaItemDto::from).collect()))
}

async fn add_media_item(
    state: web::Data<AppState>,
    Json(req): Json<CreateMediaItemRequest>,
) -> Result<HttpResponse, ApiError> {
    let owner_id = PerformerId::from_str(&req.owner_id)?;
    let title = non_blank("title", req.title)?;
    let id = state.id_generator.next_id().await?;
    let item = MediaItem::new(MediaItemId::from(id), title, owner_id);
    state
        .repo
        .add_media_item(&state.unit_of_work(), &item)
        .await?;
    info!("media item {} added for performer {}", item.id, item.owner_id);
    Ok(HttpResponse::Created().json(MediaItemDto::from(item)))
}

async fn record_play(
    state: web::Data<AppState>,
    Json(req): Json<RecordPlayRequest>,
) -> Result<HttpResponse, ApiError> {
    let key = req.into_key()?;
    state.repo.record_play(&state.unit_of_work(), key).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn get_monthly_plays(
    state: web::Data<AppState>,
    Query(query): Query<MonthlyPlaysQuery>,
) -> Result<Json<MonthlyPlaysDto>, ApiError> {
    let performer_id = PerformerId::from_str(&query.performer_id)?;
    let period = PlayPeriod::new(query.month, query.year)?;
    let total_plays = state
        .repo
        .get_monthly_plays(&state.unit_of_work(), performer_id, period)
        .await?;
    debug!(
        "monthly plays of performer {} in {}: {:?}",
        performer_id, period, total_plays
    );
    Ok(Json(MonthlyPlaysDto {
        performer_id: performer_id.to_string(),
        month: period.month(),
        year: period.year(),
        total_plays,
    }))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub fn configure_service(svc: &mut web::ServiceConfig) {
    info!("http config for /api");
    // 提取器失败也按统一的 JSON 错误格式返回
    let json_cfg = web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into());
    let query_cfg = web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into());

    svc.service(
        web::scope("/api")
            .app_data(json_cfg)
            .app_data(query_cfg)
            .service(
                web::resource("/performers")
                    .route(web::get().to(list_performers))
                    .route(web::post().to(create_performer)),
            )
            .service(
                web::resource("/media-items")
                    .route(web::get().to(list_media_items))
                    .route(web::post().to(add_media_item)),
            )
            .service(
                web::resource("/plays")
                    .route(web::get().to(get_monthly_plays))
                    .route(web::post().to(record_play)),
            )
            .route("/health", web::get().to(health)),
    );
}
