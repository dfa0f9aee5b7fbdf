use crate::{feed::admit_cells, store::FuelQuote};

const DELIMITER: char = ',';

/// 解析逗號分隔的油價表，第一列為標題不納入
pub fn parse(text: &str) -> Vec<FuelQuote> {
    text.split('\n')
        .skip(1)
        .filter_map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let cells: Vec<Option<&str>> = line.split(DELIMITER).map(Some).collect();
            admit_cells(&cells)
        })
        .collect()
}
