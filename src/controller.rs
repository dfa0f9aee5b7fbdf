//! 刷新流程。
//!
//! - 主要流程：抓取資料源 → 解析 → 整份替換 [`QuoteStore`] → 更新篩選選項 → 重新顯示。
//! - 輔助流程：同時查詢匯率與油價，各自獨立降級。
//! - 使用者變更篩選條件時只重新顯示，不重新抓取。
//!
//! 主要流程失敗時保留上一份資料與上一次的畫面，只記錄錯誤。

use std::sync::{
    atomic::{AtomicBool, Ordering},
    PoisonError, RwLock,
};

use scopeguard::defer;

use crate::{
    config,
    display::{DisplayProjector, FilterState, Frame},
    error::RefreshError,
    feed::FeedParser,
    logging,
    market::{currency::CurrencyRate, oil::OilPrice, MarketSource, MarketView},
    source::{FeedSource, HttpFeed},
    store::QuoteStore,
    surface::Surface,
    util::clock::{Clock, SystemClock},
};

/// 主要流程單次執行的結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// 成功替換，內含資料筆數
    Updated(usize),
    /// 前一次刷新尚未結束
    Skipped,
}

pub struct RefreshController {
    store: QuoteStore,
    filter: RwLock<FilterState>,
    parser: FeedParser,
    projector: DisplayProjector,
    feed: Box<dyn FeedSource>,
    currency: Box<dyn MarketSource>,
    oil: Box<dyn MarketSource>,
    surface: Box<dyn Surface>,
    clock: Box<dyn Clock>,
    last_frame: RwLock<Option<Frame>>,
    last_market: RwLock<MarketView>,
    /// 主要流程是否正在執行
    refreshing: AtomicBool,
    /// 主要流程成功後是否一併更新市場數據
    follow_feed: bool,
}

impl RefreshController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        parser: FeedParser,
        projector: DisplayProjector,
        feed: Box<dyn FeedSource>,
        currency: Box<dyn MarketSource>,
        oil: Box<dyn MarketSource>,
        surface: Box<dyn Surface>,
        clock: Box<dyn Clock>,
        filter: FilterState,
    ) -> Self {
        RefreshController {
            store: QuoteStore::new(),
            filter: RwLock::new(filter),
            parser,
            projector,
            feed,
            currency,
            oil,
            surface,
            clock,
            last_frame: RwLock::new(None),
            last_market: RwLock::new(MarketView::default()),
            refreshing: AtomicBool::new(false),
            follow_feed: false,
        }
    }

    pub fn from_settings(app: &config::App, surface: Box<dyn Surface>) -> Self {
        RefreshController::new(
            FeedParser::from_settings(&app.feed),
            DisplayProjector::from_settings(&app.display),
            Box::new(HttpFeed::from_settings(&app.feed)),
            Box::new(CurrencyRate::from_settings(&app.market)),
            Box::new(OilPrice::from_settings(&app.market)),
            surface,
            Box::new(SystemClock),
            FilterState::new(&app.display.fuel_type, &app.display.region),
        )
        .follow_feed(app.market.follow_feed)
    }

    pub fn follow_feed(mut self, follow: bool) -> Self {
        self.follow_feed = follow;
        self
    }

    pub fn store(&self) -> &QuoteStore {
        &self.store
    }

    pub fn filter(&self) -> FilterState {
        self.filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.last_frame
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_market(&self) -> MarketView {
        self.last_market
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 主要流程，同一時間只會有一個在執行
    pub async fn refresh_feed(&self) -> Result<RefreshOutcome, RefreshError> {
        if self.refreshing.swap(true, Ordering::AcqRel) {
            logging::warn_file_async("A feed refresh is already in flight, skipped".to_string());
            return Ok(RefreshOutcome::Skipped);
        }
        defer! {
            self.refreshing.store(false, Ordering::Release);
        }

        let raw = self.feed.fetch().await?;
        self.store.replace(self.parser.parse(&raw)?);

        let snapshot = self.store.snapshot();
        if snapshot.is_empty() {
            logging::warn_file_async("The feed contains no admissible rows".to_string());
        }
        let count = snapshot.len();

        self.populate_filters();
        self.render();
        logging::info_file_async(format!("Feed refreshed with {} quotes", count));

        if self.follow_feed {
            self.refresh_market().await;
        }

        Ok(RefreshOutcome::Updated(count))
    }

    /// 輔助流程，不會失敗，取不到的欄位顯示 n/a
    pub async fn refresh_market(&self) -> MarketView {
        let market = MarketView::fetch(self.currency.as_ref(), self.oil.as_ref()).await;
        self.surface.render_market(&market);

        *self
            .last_market
            .write()
            .unwrap_or_else(PoisonError::into_inner) = market.clone();
        market
    }

    pub fn set_filter(&self, fuel_type: &str, region: &str) -> Frame {
        self.update_filter(|filter| *filter = FilterState::new(fuel_type, region))
    }

    pub fn set_fuel_type(&self, fuel_type: &str) -> Frame {
        self.update_filter(|filter| filter.fuel_type = fuel_type.trim().to_string())
    }

    pub fn set_region(&self, region: &str) -> Frame {
        self.update_filter(|filter| filter.region = region.trim().to_string())
    }

    fn update_filter(&self, change: impl FnOnce(&mut FilterState)) -> Frame {
        {
            let mut filter = self.filter.write().unwrap_or_else(PoisonError::into_inner);
            change(&mut filter);
        }
        self.render()
    }

    /// 以目前的資料與篩選條件重新顯示
    pub fn render(&self) -> Frame {
        let snapshot = self.store.snapshot();
        let filter = self.filter();
        let frame = Frame {
            view: self.projector.render(&snapshot, &filter),
            rendered_at: self.clock.now(),
        };

        self.surface.render_quote(&frame);
        *self
            .last_frame
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(frame.clone());
        frame
    }

    /// 更新篩選選項；尚未選取的條件預設為第一個選項，已選取的即使不在新資料中也保留
    fn populate_filters(&self) {
        let snapshot = self.store.snapshot();
        let fuel_types = snapshot.distinct_fuel_types();
        let regions = snapshot.distinct_regions();

        {
            let mut filter = self.filter.write().unwrap_or_else(PoisonError::into_inner);
            if filter.fuel_type.is_empty() {
                if let Some(first) = fuel_types.first() {
                    filter.fuel_type = first.clone();
                }
            }
            if filter.region.is_empty() {
                if let Some(first) = regions.first() {
                    filter.region = first.clone();
                }
            }
        }

        self.surface.populate_filters(&fuel_types, &regions);
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use async_trait::async_trait;
    use chrono::{Local, TimeZone};
    use rust_decimal_macros::dec;

    use crate::{
        declare::{FeedShape, Trend},
        error::{FetchError, ParseError},
        market::{tests::FakeSource, NOT_AVAILABLE},
        util::clock::FixedClock,
    };

    use super::*;

    const CSV: &str = "Type,Region,Prev,Cur,Pred\nDiesel,Inland,18.50,18.75,18.60\n";

    /// 依序回傳預先排好的結果
    struct ScriptedFeed {
        responses: Mutex<VecDeque<Result<Vec<u8>, FetchError>>>,
        delay: Duration,
    }

    impl ScriptedFeed {
        fn new(responses: Vec<Result<&str, &str>>) -> Self {
            let responses = responses
                .into_iter()
                .map(|r| match r {
                    Ok(body) => Ok(body.as_bytes().to_vec()),
                    Err(reason) => Err(FetchError::Transport {
                        url: "fake://feed".to_string(),
                        reason: reason.to_string(),
                    }),
                })
                .collect();
            ScriptedFeed {
                responses: Mutex::new(responses),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl FeedSource for ScriptedFeed {
        async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::MissingField("scripted response")))
        }
    }

    #[derive(Default)]
    struct Recorded {
        filters: Vec<(Vec<String>, Vec<String>)>,
        frames: Vec<Frame>,
        markets: Vec<MarketView>,
    }

    #[derive(Default, Clone)]
    struct RecordingSurface(Arc<Mutex<Recorded>>);

    impl Surface for RecordingSurface {
        fn populate_filters(&self, fuel_types: &[String], regions: &[String]) {
            self.0
                .lock()
                .unwrap()
                .filters
                .push((fuel_types.to_vec(), regions.to_vec()));
        }

        fn render_quote(&self, frame: &Frame) {
            self.0.lock().unwrap().frames.push(frame.clone());
        }

        fn render_market(&self, market: &MarketView) {
            self.0.lock().unwrap().markets.push(market.clone());
        }
    }

    fn controller(
        feed: ScriptedFeed,
        surface: RecordingSurface,
        filter: FilterState,
    ) -> RefreshController {
        RefreshController::new(
            FeedParser::new(FeedShape::Csv),
            DisplayProjector::from_settings(&config::Display::default()),
            Box::new(feed),
            Box::new(FakeSource::currency(None)),
            Box::new(FakeSource::oil(Some(dec!(82.4)))),
            Box::new(surface),
            Box::new(FixedClock(Local.with_ymd_and_hms(2024, 3, 6, 9, 30, 0).unwrap())),
            filter,
        )
    }

    #[tokio::test]
    async fn test_refresh_renders_selected_quote() {
        let surface = RecordingSurface::default();
        let c = controller(
            ScriptedFeed::new(vec![Ok(CSV)]),
            surface.clone(),
            FilterState::new("Diesel", "Inland"),
        );

        assert_eq!(c.refresh_feed().await.unwrap(), RefreshOutcome::Updated(1));

        let frame = c.last_frame().unwrap();
        assert_eq!(frame.view.current, "18.75");
        assert_eq!(frame.view.delta, "-0.150");
        assert_eq!(frame.view.trend, Trend::DownGood);
        assert_eq!(frame.rendered_at, Local.with_ymd_and_hms(2024, 3, 6, 9, 30, 0).unwrap());

        let recorded = surface.0.lock().unwrap();
        assert_eq!(
            recorded.filters,
            vec![(vec!["Diesel".to_string()], vec!["Inland".to_string()])]
        );
        assert_eq!(recorded.frames.len(), 1);
        assert!(recorded.markets.is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_last_good_state() {
        let surface = RecordingSurface::default();
        let c = controller(
            ScriptedFeed::new(vec![Ok(CSV), Err("connection reset")]),
            surface.clone(),
            FilterState::new("Diesel", "Inland"),
        );

        c.refresh_feed().await.unwrap();
        let before_frame = c.last_frame();
        let before_store = c.store().snapshot();

        let result = c.refresh_feed().await;
        assert!(matches!(result, Err(RefreshError::Fetch(_))));
        assert_eq!(c.last_frame(), before_frame);
        assert_eq!(*c.store().snapshot(), *before_store);
        assert_eq!(surface.0.lock().unwrap().frames.len(), 1);

        // 失敗後下一次仍可正常刷新
        let c = controller(
            ScriptedFeed::new(vec![Err("timeout"), Ok(CSV)]),
            RecordingSurface::default(),
            FilterState::new("Diesel", "Inland"),
        );
        assert!(c.refresh_feed().await.is_err());
        assert_eq!(c.refresh_feed().await.unwrap(), RefreshOutcome::Updated(1));
    }

    #[tokio::test]
    async fn test_unreadable_payload_keeps_store() {
        let c = RefreshController::new(
            FeedParser::new(FeedShape::Table),
            DisplayProjector::default(),
            Box::new(ScriptedFeed::new(vec![Ok("not a wrapped table")])),
            Box::new(FakeSource::currency(None)),
            Box::new(FakeSource::oil(None)),
            Box::new(RecordingSurface::default()),
            Box::new(SystemClock),
            FilterState::default(),
        );

        let result = c.refresh_feed().await;
        assert!(matches!(result, Err(RefreshError::Parse(ParseError::Unreadable(_)))));
        assert!(c.store().snapshot().is_empty());
        assert!(c.last_frame().is_none());
    }

    #[tokio::test]
    async fn test_filter_change_rerenders_without_refetch() {
        let csv = "Type,Region,Prev,Cur,Pred\n\
                   Diesel,Inland,18.50,18.75,18.60\n\
                   Petrol 95,Inland,21.00,21.10,21.30\n\
                   Petrol 93,Coastal,20.00,20.10,20.10\n";
        let surface = RecordingSurface::default();
        let c = controller(
            ScriptedFeed::new(vec![Ok(csv)]),
            surface.clone(),
            FilterState::new("Diesel", "Inland"),
        );
        c.refresh_feed().await.unwrap();

        let frame = c.set_fuel_type("Petrol 95");
        assert_eq!(frame.view.trend, Trend::UpBad);
        assert_eq!(frame.view.delta, "0.200");

        let frame = c.set_filter("Petrol 93", "coastal");
        assert!(!frame.view.valid);
        assert!(frame.view.warning.is_some());

        let frame = c.set_region("Nowhere");
        assert!(!frame.view.valid);
        assert_eq!(frame.view.warning, None);

        // 篩選選項只在抓取後更新
        assert_eq!(surface.0.lock().unwrap().filters.len(), 1);
        assert_eq!(surface.0.lock().unwrap().frames.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_filter_selects_first_options() {
        let csv = "Type,Region,Prev,Cur,Pred\n\
                   Petrol 95,Coastal,21.00,21.10,21.30\n\
                   Diesel,Inland,18.50,18.75,18.60\n";
        let c = controller(
            ScriptedFeed::new(vec![Ok(csv)]),
            RecordingSurface::default(),
            FilterState::default(),
        );
        c.refresh_feed().await.unwrap();

        assert_eq!(c.filter(), FilterState::new("Petrol 95", "Coastal"));
        assert_eq!(c.last_frame().unwrap().view.current, "21.10");
    }

    #[tokio::test]
    async fn test_stale_selection_is_kept() {
        let next = "Type,Region,Prev,Cur,Pred\nPetrol 95,Coastal,21.00,21.10,21.30\n";
        let c = controller(
            ScriptedFeed::new(vec![Ok(CSV), Ok(next)]),
            RecordingSurface::default(),
            FilterState::new("Diesel", "Inland"),
        );
        c.refresh_feed().await.unwrap();
        c.refresh_feed().await.unwrap();

        assert_eq!(c.filter(), FilterState::new("Diesel", "Inland"));
        let frame = c.last_frame().unwrap();
        assert!(!frame.view.valid);
        assert_eq!(frame.view.current, "--");
    }

    #[tokio::test]
    async fn test_market_degrades_independently() {
        let surface = RecordingSurface::default();
        let c = controller(
            ScriptedFeed::new(vec![Ok(CSV)]),
            surface.clone(),
            FilterState::new("Diesel", "Inland"),
        )
        .follow_feed(true);

        c.refresh_feed().await.unwrap();

        let market = c.last_market();
        assert_eq!(market.zar_usd, NOT_AVAILABLE);
        assert_eq!(market.brent, "82.40");
        assert_eq!(surface.0.lock().unwrap().markets, vec![market]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_refresh_is_skipped() {
        let c = Arc::new(controller(
            ScriptedFeed::new(vec![Ok(CSV), Ok(CSV)]).with_delay(Duration::from_secs(5)),
            RecordingSurface::default(),
            FilterState::new("Diesel", "Inland"),
        ));

        let first = {
            let c = Arc::clone(&c);
            tokio::spawn(async move { c.refresh_feed().await })
        };
        tokio::task::yield_now().await;

        assert_eq!(c.refresh_feed().await.unwrap(), RefreshOutcome::Skipped);
        assert_eq!(first.await.unwrap().unwrap(), RefreshOutcome::Updated(1));

        // 前一次結束後可以再次執行
        assert_eq!(c.refresh_feed().await.unwrap(), RefreshOutcome::Updated(1));
    }

    #[tokio::test]
    async fn test_excluded_filter_before_any_data() {
        let c = controller(
            ScriptedFeed::new(vec![]),
            RecordingSurface::default(),
            FilterState::new("Petrol 93", "Coastal"),
        );
        let frame = c.render();
        assert!(!frame.view.valid);
        assert_eq!(
            frame.view.warning.as_deref(),
            Some("Petrol 93 is not sold in Coastal regions")
        );
    }
}
