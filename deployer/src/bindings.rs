// deployer/src/bindings.rs
#![allow(clippy::all)]
use ethers::prelude::abigen;

abigen!(
    MockERC20Token,
    r#"[
        event Transfer(address indexed from, address indexed to, uint256 value)
        function mint(address to, uint256 amount) external
        function balanceOf(address account) external view returns (uint256)
        function decimals() external view returns (uint8)
        function symbol() external view returns (string)
        function name() external view returns (string)
        function totalSupply() external view returns (uint256)
    ]"#,
    event_derives(serde::Deserialize, serde::Serialize)
);

abigen!(
    MockUniswapV3Router,
    r#"[
        function setExchangeRates(address[] tokensIn, address[] tokensOut, uint256[] rates) external
        function swap(address fromToken, address toToken, uint256 amount) external
    ]"#
);

// END OF FILE: deployer/src/bindings.rs
