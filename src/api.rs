use crate::data_structures::{AppState, ServiceDefaults, SharedDefaults};
use crate::page::INDEX_HTML;
use crate::provider::{normalize_ticker, ProviderError, SharedProvider};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::Query;
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use stocktracer::analysis::{analyze, AnalysisConfig, IndicatorBasis};
use stocktracer::models::AnalystInsights;
use stocktracer::report::{build_report, insights_markdown, SortOrder, WeekdayReport, INSIGHTS_PARTIAL_NOTE};
use stocktracer::services::write_rows;
use stocktracer::utils::{default_date_range, earliest_start, parse_date, parse_weekday, today, weekday_name};
use stocktracer::TracerError;
use tracing::{debug, error, info, instrument, warn};

// --- Errors ---

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    BadRequest(String),
    NoData(String),
    NoWeekdayData(String),
    Upstream(String),
    Internal(String),
}

impl ApiError {
    fn upstream(error: ProviderError) -> Self {
        match error {
            ProviderError::InvalidTicker(_) => ApiError::BadRequest(error.to_string()),
            other => ApiError::Upstream(format!(
                "Error fetching data: {}. Please check the ticker symbol or date range.",
                other
            )),
        }
    }

    fn from_tracer(error: TracerError, ticker: &str) -> Self {
        match error {
            TracerError::EmptyInput => ApiError::NoData(error.to_string()),
            TracerError::EmptyFilterResult { weekday } => ApiError::NoWeekdayData(format!(
                "No data available for {} on {}s in the selected date range.",
                ticker,
                weekday_name(weekday)
            )),
            other => ApiError::BadRequest(other.to_string()),
        }
    }

    fn parts(&self) -> (StatusCode, &'static str, &str) {
        match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m),
            ApiError::NoData(m) => (StatusCode::NOT_FOUND, "no_data", m),
            ApiError::NoWeekdayData(m) => (StatusCode::NOT_FOUND, "no_weekday_data", m),
            ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, "upstream", m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", m),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = self.parts();
        match &self {
            ApiError::NoWeekdayData(_) | ApiError::NoData(_) => warn!(kind, reason = message, "Analysis produced no rows"),
            ApiError::Upstream(_) | ApiError::Internal(_) => error!(kind, reason = message, "Request failed"),
            ApiError::BadRequest(_) => debug!(kind, reason = message, "Rejected request"),
        }
        (status, Json(ErrorBody { error: kind, message })).into_response()
    }
}

// --- Query parsing ---

/// Raw query string of the analysis endpoints. Blank values count as absent
/// except for `ticker`.
#[derive(Debug, Default, Deserialize)]
pub struct AnalysisQuery {
    pub ticker: Option<String>,
    pub day: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub order: Option<String>,
    pub basis: Option<String>,
    pub period: Option<String>,
    pub rsi_period: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub ticker: String,
    pub weekday: Weekday,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub order: SortOrder,
    pub config: AnalysisConfig,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_period(name: &str, value: &Option<String>) -> Result<Option<usize>, ApiError> {
    present(value)
        .map(|raw| {
            raw.parse::<usize>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid {} '{}', expected a whole number.", name, raw)))
        })
        .transpose()
}

impl AnalysisQuery {
    pub fn resolve(&self, defaults: &ServiceDefaults, today: NaiveDate) -> Result<AnalysisRequest, ApiError> {
        let ticker = resolve_ticker(self.ticker.as_deref(), defaults)?;

        let weekday = match present(&self.day) {
            Some(day) => parse_weekday(day).map_err(|e| ApiError::BadRequest(e.to_string()))?,
            None => Weekday::Fri,
        };

        let end = match present(&self.end) {
            Some(end) => parse_date(end).map_err(|e| ApiError::BadRequest(e.to_string()))?,
            None => today,
        };
        let start = match present(&self.start) {
            Some(start) => parse_date(start).map_err(|e| ApiError::BadRequest(e.to_string()))?,
            None => default_date_range(end, defaults.lookback_weeks).0,
        };

        if end > today {
            return Err(ApiError::BadRequest(format!("End date {} is in the future.", end)));
        }
        if start < earliest_start() {
            return Err(ApiError::BadRequest(format!(
                "Start date must be on or after {}.",
                earliest_start()
            )));
        }
        if start > end {
            return Err(ApiError::BadRequest("Start date must not be after the end date.".to_string()));
        }

        let order = match present(&self.order) {
            Some(order) => order.parse::<SortOrder>().map_err(ApiError::BadRequest)?,
            None => SortOrder::default(),
        };

        let mut config = defaults.analysis;
        if let Some(basis) = present(&self.basis) {
            config.basis = basis.parse::<IndicatorBasis>().map_err(ApiError::BadRequest)?;
        }
        if let Some(period) = parse_period("period", &self.period)? {
            config.indicators.stochastic_period = period;
        }
        if let Some(rsi_period) = parse_period("rsi_period", &self.rsi_period)? {
            config.indicators.rsi_period = rsi_period;
        }
        config
            .indicators
            .validate()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        Ok(AnalysisRequest { ticker, weekday, start, end, order, config })
    }
}

fn resolve_ticker(raw: Option<&str>, defaults: &ServiceDefaults) -> Result<String, ApiError> {
    match raw {
        Some(raw) => normalize_ticker(raw).map_err(|_| ApiError::BadRequest("Please enter a ticker symbol.".to_string())),
        None => Ok(defaults.ticker.clone()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct InsightsQuery {
    pub ticker: Option<String>,
}

// --- Responses ---

#[derive(Debug, Clone, Serialize)]
pub struct InsightsView {
    pub ticker: String,
    #[serde(flatten)]
    pub insights: AnalystInsights,
    pub text: String,
    pub note: Option<&'static str>,
}

impl InsightsView {
    fn new(ticker: &str, insights: AnalystInsights) -> Self {
        let note = (!insights.is_complete()).then_some(INSIGHTS_PARTIAL_NOTE);
        Self {
            ticker: ticker.to_string(),
            text: insights_markdown(&insights),
            insights,
            note,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub report: WeekdayReport,
    pub insights: InsightsView,
}

async fn load_report(provider: &SharedProvider, request: &AnalysisRequest) -> Result<WeekdayReport, ApiError> {
    let series = provider
        .fetch_history(&request.ticker, request.start, request.end)
        .await
        .map_err(ApiError::upstream)?;

    let analysis = analyze(&series, request.weekday, &request.config)
        .map_err(|e| ApiError::from_tracer(e, &request.ticker))?;

    info!(rows = analysis.rows.len(), basis = %analysis.basis, "Analysis complete");
    Ok(build_report(&request.ticker, request.start, request.end, &analysis, request.order))
}

async fn load_insights(provider: &SharedProvider, ticker: &str) -> InsightsView {
    let insights = match provider.fetch_insights(ticker).await {
        Ok(insights) => insights,
        Err(e) => {
            warn!(ticker, error = %e, "Analyst insights unavailable");
            AnalystInsights::unavailable()
        }
    };
    InsightsView::new(ticker, insights)
}

// --- Handlers ---

pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

#[instrument(skip(provider, defaults, query), fields(ticker = tracing::field::Empty, weekday = tracing::field::Empty))]
pub async fn analysis_handler(
    State(provider): State<SharedProvider>,
    State(defaults): State<SharedDefaults>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let request = query.resolve(&defaults, today())?;
    record_request(&request);

    let (report, insights) = futures::future::join(
        load_report(&provider, &request),
        load_insights(&provider, &request.ticker),
    )
    .await;

    Ok(Json(AnalysisResponse { report: report?, insights }))
}

#[instrument(skip(provider, defaults, query), fields(ticker = tracing::field::Empty, weekday = tracing::field::Empty))]
pub async fn analysis_csv_handler(
    State(provider): State<SharedProvider>,
    State(defaults): State<SharedDefaults>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Response, ApiError> {
    let request = query.resolve(&defaults, today())?;
    record_request(&request);

    let report = load_report(&provider, &request).await?;

    let mut body = Vec::new();
    write_rows(&mut body, &report.table).map_err(|e| ApiError::Internal(e.to_string()))?;

    let disposition = format!(
        "attachment; filename=\"{}_{}.csv\"",
        request.ticker,
        weekday_name(request.weekday).to_lowercase()
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

#[instrument(skip(provider, defaults, query))]
pub async fn insights_handler(
    State(provider): State<SharedProvider>,
    State(defaults): State<SharedDefaults>,
    Query(query): Query<InsightsQuery>,
) -> Result<Json<InsightsView>, ApiError> {
    let ticker = resolve_ticker(query.ticker.as_deref(), &defaults)?;
    Ok(Json(load_insights(&provider, &ticker).await))
}

fn record_request(request: &AnalysisRequest) {
    let span = tracing::Span::current();
    span.record("ticker", request.ticker.as_str());
    span.record("weekday", weekday_name(request.weekday));
    debug!(start = %request.start, end = %request.end, "Resolved analysis request");
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/analysis", get(analysis_handler))
        .route("/api/analysis.csv", get(analysis_csv_handler))
        .route("/api/insights", get(insights_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::tests::StubProvider;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::{Datelike, Duration};
    use serde_json::Value;
    use std::sync::Arc;
    use stocktracer::models::{PriceBar, PriceSeries};
    use tower::ServiceExt;

    fn weekday_series() -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = (0..150)
            .map(|i| start + Duration::days(i))
            .filter(|d| d.weekday().num_days_from_monday() < 5)
            .enumerate()
            .map(|(i, date)| {
                let c = 180.0 + (i as f64 * 0.41).sin() * 9.0;
                PriceBar::new(date, c - 0.5, c + 1.5, c - 1.7, c, 50_000 + i as u64)
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    fn app_with(stub: StubProvider) -> Router {
        router(AppState::new(Arc::new(stub), ServiceDefaults::default()))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn june_28() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
    }

    #[test]
    fn test_resolve_defaults() {
        let request = AnalysisQuery::default()
            .resolve(&ServiceDefaults::default(), june_28())
            .unwrap();
        assert_eq!(request.ticker, "AAPL");
        assert_eq!(request.weekday, Weekday::Fri);
        assert_eq!(request.end, june_28());
        assert_eq!(request.start, NaiveDate::from_ymd_opt(2023, 6, 30).unwrap());
        assert_eq!(request.order, SortOrder::Descending);
        assert_eq!(request.config.basis, IndicatorBasis::Filtered);
    }

    #[test]
    fn test_resolve_blank_fields_use_defaults() {
        let query = AnalysisQuery {
            day: Some(" ".to_string()),
            start: Some(String::new()),
            end: Some(String::new()),
            ..AnalysisQuery::default()
        };
        let request = query.resolve(&ServiceDefaults::default(), june_28()).unwrap();
        assert_eq!(request.weekday, Weekday::Fri);
        assert_eq!(request.end, june_28());
    }

    #[test]
    fn test_resolve_rejects_bad_input() {
        let defaults = ServiceDefaults::default();
        let cases = [
            AnalysisQuery { ticker: Some("  ".into()), ..Default::default() },
            AnalysisQuery { day: Some("someday".into()), ..Default::default() },
            AnalysisQuery { start: Some("1999-12-31".into()), ..Default::default() },
            AnalysisQuery { start: Some("2024-06-01".into()), end: Some("2024-05-01".into()), ..Default::default() },
            AnalysisQuery { end: Some("2024-06-29".into()), ..Default::default() },
            AnalysisQuery { end: Some("06/01/2024".into()), ..Default::default() },
            AnalysisQuery { order: Some("sideways".into()), ..Default::default() },
            AnalysisQuery { basis: Some("hourly".into()), ..Default::default() },
            AnalysisQuery { period: Some("0".into()), ..Default::default() },
            AnalysisQuery { period: Some("abc".into()), ..Default::default() },
            AnalysisQuery { rsi_period: Some("10000000000000".into()), ..Default::default() },
            AnalysisQuery { period: Some("2305843009213693952".into()), ..Default::default() },
            AnalysisQuery { rsi_period: Some("-4".into()), ..Default::default() },
        ];
        for query in cases {
            let result = query.resolve(&defaults, june_28());
            assert!(matches!(result, Err(ApiError::BadRequest(_))), "{:?} -> {:?}", query, result);
        }
    }

    #[test]
    fn test_resolve_overrides() {
        let query = AnalysisQuery {
            ticker: Some(" msft ".into()),
            day: Some("tue".into()),
            order: Some("asc".into()),
            basis: Some("daily".into()),
            period: Some("5".into()),
            rsi_period: Some(" 7 ".into()),
            ..Default::default()
        };
        let request = query.resolve(&ServiceDefaults::default(), june_28()).unwrap();
        assert_eq!(request.ticker, "MSFT");
        assert_eq!(request.weekday, Weekday::Tue);
        assert_eq!(request.order, SortOrder::Ascending);
        assert_eq!(request.config.basis, IndicatorBasis::Daily);
        assert_eq!(request.config.indicators.stochastic_period, 5);
        assert_eq!(request.config.indicators.rsi_period, 7);
    }

    #[tokio::test]
    async fn test_health_and_index() {
        let app = app_with(StubProvider::with_series(PriceSeries::empty()));
        let (status, body) = get_json(app.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&html).contains("/api/analysis"));
    }

    #[tokio::test]
    async fn test_analysis_report() {
        let app = app_with(StubProvider::with_series(weekday_series()));
        let (status, body) =
            get_json(app, "/api/analysis?ticker=aapl&day=friday&start=2024-01-01&end=2024-05-01").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ticker"], "AAPL");
        assert_eq!(body["weekday"], "Friday");
        assert_eq!(body["heading"], "AAPL Performance on Fridays (2024-01-01 to 2024-05-01)");

        let table = body["table"].as_array().unwrap();
        // Fridays from 2024-01-05 through 2024-04-26
        assert_eq!(table.len(), 17);
        assert_eq!(table[0]["Date"], "2024-04-26");
        assert_eq!(table[16]["Date"], "2024-01-05");
        assert!(table[16]["%K"].is_null());
        assert!(table[0]["%K"].is_number());
        assert!(table[0]["RSI"].is_number());

        assert_eq!(body["charts"]["ohlc"]["title"], "AAPL Stock OHLC Chart on Fridays");
        assert_eq!(body["insights"]["recommendation"], "Buy");
        assert!(body["insights"]["note"].is_null());
        assert!(body["summary_text"].as_str().unwrap().starts_with("- Average Open: "));
    }

    #[tokio::test]
    async fn test_analysis_no_weekday_rows() {
        let app = app_with(StubProvider::with_series(weekday_series()));
        let (status, body) =
            get_json(app, "/api/analysis?ticker=AAPL&day=saturday&start=2024-01-01&end=2024-05-01").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "no_weekday_data");
        assert_eq!(body["message"], "No data available for AAPL on Saturdays in the selected date range.");
    }

    #[tokio::test]
    async fn test_analysis_empty_range() {
        let app = app_with(StubProvider::with_series(weekday_series()));
        let (status, body) = get_json(app, "/api/analysis?start=2010-01-01&end=2010-02-01").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "no_data");
    }

    #[tokio::test]
    async fn test_analysis_upstream_failure() {
        let mut stub = StubProvider::with_series(PriceSeries::empty());
        stub.fail_history = true;
        let (status, body) = get_json(app_with(stub), "/api/analysis?ticker=ZZZZ&end=2024-05-01").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            body["message"],
            "Error fetching data: No data found, symbol may be delisted. Please check the ticker symbol or date range."
        );
    }

    #[tokio::test]
    async fn test_analysis_bad_request() {
        let app = app_with(StubProvider::with_series(weekday_series()));
        let (status, body) = get_json(app, "/api/analysis?start=1990-01-01&end=2024-01-01").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_analysis_bad_periods_get_json_errors() {
        let stub = StubProvider::with_series(weekday_series());
        let app = app_with(stub);
        for uri in [
            "/api/analysis?end=2024-05-01&period=abc",
            "/api/analysis?end=2024-05-01&rsi_period=10000000000000",
        ] {
            let (status, body) = get_json(app.clone(), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["error"], "bad_request");
            assert!(body["message"].is_string());
        }
    }

    #[tokio::test]
    async fn test_analysis_csv() {
        let app = app_with(StubProvider::with_series(weekday_series()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/analysis.csv?ticker=aapl&day=mon&start=2024-01-01&end=2024-02-01&order=asc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"AAPL_monday.csv\""
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Date,Open,High,Low,Close,Volume,Variance,%K,%D,RSI");
        // Mondays 2024-01-01 .. 2024-01-29, oldest first
        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with("2024-01-01,"));
        assert!(lines[1].ends_with("N/A,N/A,N/A"));
    }

    #[tokio::test]
    async fn test_insights_unavailable_is_not_an_error() {
        let mut stub = StubProvider::with_series(PriceSeries::empty());
        stub.insights = None;
        let (status, body) = get_json(app_with(stub), "/api/insights?ticker=tsla").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ticker"], "TSLA");
        assert!(body["recommendation"].is_null());
        assert_eq!(body["note"], INSIGHTS_PARTIAL_NOTE);
        assert_eq!(body["text"], "- Analyst Recommendation: N/A\n- Mean Price Target: N/A");
    }
}
