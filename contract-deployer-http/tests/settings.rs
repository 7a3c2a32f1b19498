use pretty_assertions::assert_eq;
use contract_deployer_http::Settings;

#[test]
fn test_example_settings() {
    std::env::set_var("CONTRACT_DEPLOYER__CONFIG", "config/base.toml");
    let (example_settings, default_settings) = {
        let mut example_settings = Settings::new().expect("Failed to parse config");
        let default_settings = Settings::default();

        // the example config ships placeholder fee wallet keys
        example_settings.ethereum.fee_wallet_key = default_settings.ethereum.fee_wallet_key.clone();
        example_settings.bnb.fee_wallet_key = default_settings.bnb.fee_wallet_key.clone();
        example_settings.celo.fee_wallet_key = default_settings.celo.fee_wallet_key.clone();

        (example_settings, default_settings)
    };
    assert_eq!(default_settings, example_settings);
}
