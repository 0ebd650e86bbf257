#![no_main]

use libfuzzer_sys::fuzz_target;
use mqbroker::{protocol, Command};

fuzz_target!(|data: &[u8]| {
    let Ok(line) = protocol::decode_frame(data, 64 * 1024) else {
        return;
    };

    // Разбор не должен паниковать ни на каких данных.
    let Ok(command) = protocol::parse_request(line) else {
        return;
    };

    // Команда без спецсимволов в полях должна пережить encode -> parse.
    let fields_clean = match &command {
        Command::Publish(cmd) => {
            protocol::is_valid_field(&cmd.topic) && protocol::is_valid_field(&cmd.content)
        }
        other => protocol::is_valid_field(other.topic()),
    };
    if fields_clean {
        let encoded = protocol::encode_request(&command);
        let reparsed = protocol::parse_request(&encoded).expect("encoded request must parse");
        assert_eq!(reparsed.app_id(), command.app_id());
        assert_eq!(reparsed.topic(), command.topic());
    }
});
