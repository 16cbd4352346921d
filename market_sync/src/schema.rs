// Mirrors migrations/2025-01-01-000000_create_market_tables.

diesel::table! {
    companies (code) {
        code -> Text,
        name -> Nullable<Text>,
        market -> Nullable<Text>,
        industry -> Nullable<Text>,
    }
}

diesel::table! {
    daily_financials (code, date) {
        code -> Text,
        date -> Text,
        market_cap -> Nullable<Double>,
        per_forecast -> Nullable<Double>,
        pbr_actual -> Nullable<Double>,
        eps_forecast -> Nullable<Double>,
        bps_actual -> Nullable<Double>,
        dividend_yield -> Nullable<Double>,
    }
}

diesel::table! {
    daily_prices (code, date) {
        code -> Text,
        date -> Text,
        open -> Nullable<Double>,
        high -> Nullable<Double>,
        low -> Nullable<Double>,
        close -> Nullable<Double>,
        volume -> Nullable<BigInt>,
    }
}

diesel::table! {
    volume_profile (code, analysis_date, price_band) {
        code -> Text,
        analysis_date -> Text,
        price_band -> Double,
        volume_sum -> BigInt,
    }
}

diesel::table! {
    weekly_margin (code, date) {
        code -> Text,
        date -> Text,
        sell_balance -> Nullable<BigInt>,
        buy_balance -> Nullable<BigInt>,
        ratio -> Nullable<Double>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    companies,
    daily_financials,
    daily_prices,
    volume_profile,
    weekly_margin,
);
