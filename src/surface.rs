use crate::{
    display::Frame,
    logging,
    market::MarketView,
};

/// 畫面更新的回呼，由顯示層實作
pub trait Surface: Send + Sync {
    /// 篩選選單的選項
    fn populate_filters(&self, fuel_types: &[String], regions: &[String]);
    fn render_quote(&self, frame: &Frame);
    fn render_market(&self, market: &MarketView);
}

/// 輸出到終端機與記錄檔
#[derive(Debug, Default)]
pub struct ConsoleSurface;

impl ConsoleSurface {
    fn quote_lines(frame: &Frame) -> Vec<String> {
        let view = &frame.view;
        let mut lines = vec![format!(
            "previous {} | current {} | predicted {} | change {} {}",
            view.previous,
            view.current,
            view.predicted,
            view.delta,
            view.trend.arrow()
        )];

        if let Some(warning) = &view.warning {
            lines.push(format!("warning: {}", warning));
        }

        if let Some(series) = &view.series {
            let points: Vec<String> = series
                .labels
                .iter()
                .zip(series.values.iter())
                .map(|(label, value)| format!("{} {}", label, value))
                .collect();
            lines.push(format!("{}: {}", series.label, points.join(" -> ")));
        }

        lines.push(format!(
            "updated {}",
            frame.rendered_at.format("%Y-%m-%d %H:%M:%S")
        ));
        lines
    }
}

impl Surface for ConsoleSurface {
    fn populate_filters(&self, fuel_types: &[String], regions: &[String]) {
        logging::info_console(format!(
            "fuel types: [{}] regions: [{}]",
            fuel_types.join(", "),
            regions.join(", ")
        ));
    }

    fn render_quote(&self, frame: &Frame) {
        for line in Self::quote_lines(frame) {
            logging::info_console(line);
        }

        if let Ok(json) = serde_json::to_string(frame) {
            logging::info_file_async(json);
        }
    }

    fn render_market(&self, market: &MarketView) {
        logging::info_console(format!("ZAR/USD {} | Brent {}", market.zar_usd, market.brent));
    }
}
