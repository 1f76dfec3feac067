use crate::shared::PaginationParams;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

pub fn validate_pagination(page: Option<u64>, limit: Option<u64>) -> PaginationParams {
    PaginationParams {
        page: page.unwrap_or(1).max(1),
        limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamps() {
        assert_eq!(
            validate_pagination(None, None),
            PaginationParams { page: 1, limit: 20 }
        );
        assert_eq!(
            validate_pagination(Some(0), Some(500)),
            PaginationParams { page: 1, limit: 100 }
        );
        assert_eq!(
            validate_pagination(Some(4), Some(0)),
            PaginationParams { page: 4, limit: 1 }
        );
    }
}
