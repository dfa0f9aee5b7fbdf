use std::str::FromStr;

use anyhow::{anyhow, Error};

use crate::{controller::RefreshController, logging};

/// 從終端機輸入的指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `Diesel,Inland`
    Filter { fuel_type: String, region: String },
    /// `fuel Diesel`
    FuelType(String),
    /// `region Inland`
    Region(String),
    /// 立即重新抓取油價資料
    Refresh,
    /// 立即更新匯率與原油價格
    Market,
    /// 以目前資料重新顯示
    Show,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        match head.to_ascii_lowercase().as_str() {
            "fuel" if !rest.is_empty() => Ok(Command::FuelType(rest.to_string())),
            "region" if !rest.is_empty() => Ok(Command::Region(rest.to_string())),
            "refresh" => Ok(Command::Refresh),
            "market" => Ok(Command::Market),
            "show" => Ok(Command::Show),
            "quit" | "exit" => Ok(Command::Quit),
            _ => match line.split_once(',') {
                Some((fuel_type, region)) => Ok(Command::Filter {
                    fuel_type: fuel_type.trim().to_string(),
                    region: region.trim().to_string(),
                }),
                None => Err(anyhow!("Unknown command: {}", line)),
            },
        }
    }
}

/// 執行指令，回傳 false 表示要結束程式
pub async fn execute(controller: &RefreshController, command: Command) -> bool {
    match command {
        Command::Filter { fuel_type, region } => {
            controller.set_filter(&fuel_type, &region);
        }
        Command::FuelType(fuel_type) => {
            controller.set_fuel_type(&fuel_type);
        }
        Command::Region(region) => {
            controller.set_region(&region);
        }
        Command::Refresh => {
            if let Err(why) = controller.refresh_feed().await {
                logging::error_console(format!("Failed to refresh the feed because {}", why));
            }
        }
        Command::Market => {
            controller.refresh_market().await;
        }
        Command::Show => {
            controller.render();
        }
        Command::Quit => return false,
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(
            Command::from_str(" Diesel , Inland ").unwrap(),
            Command::Filter {
                fuel_type: "Diesel".to_string(),
                region: "Inland".to_string()
            }
        );
        assert_eq!(
            Command::from_str("fuel Petrol 95").unwrap(),
            Command::FuelType("Petrol 95".to_string())
        );
        assert_eq!(
            Command::from_str("REGION  Coastal").unwrap(),
            Command::Region("Coastal".to_string())
        );
        assert_eq!(Command::from_str("refresh").unwrap(), Command::Refresh);
        assert_eq!(Command::from_str("market").unwrap(), Command::Market);
        assert_eq!(Command::from_str("show").unwrap(), Command::Show);
        assert_eq!(Command::from_str("exit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(Command::from_str("hello").is_err());
        assert!(Command::from_str("fuel").is_err());
        assert!(Command::from_str("").is_err());
    }

    #[test]
    fn test_comma_line_is_filter() {
        assert_eq!(
            Command::from_str("fuel,Inland").unwrap(),
            Command::Filter {
                fuel_type: "fuel".to_string(),
                region: "Inland".to_string()
            }
        );
    }
}
