//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# pplx configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[service]
# base_url = "https://www.perplexity.ai"
# ask_path = "/rest/sse/perplexity_ask"
# user_agent = "Mozilla/5.0 ..."
# connect_timeout_secs = 10   # 1-60
# request_timeout_secs = 120  # 10-600; idle gap limit for streamed answers

[chat]
# model = "turbo"
# search_focus = "internet"
# web_search = true
# language = "en-US"
# mode = "concise"
# answer_usage = "ask_text"

[jitter]
# min_ms = 250
# max_ms = 1500               # 0 disables the pre-request delay

[storage]
# data_dir = ""               # empty = platform data directory

[events]
# capacity = 1024             # 16-65536

[logging]
# level = "INFO"              # DEBUG, INFO, WARNING, ERROR
"##
    .to_string()
}
