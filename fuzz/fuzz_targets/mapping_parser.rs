#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlretag::{TagMapping, from_xml_str};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let (mapping, report) = TagMapping::parse(text);
        assert!(mapping.len() <= report.rules);

        // Every accepted target must come back as a tag name
        for (_, new) in &mapping {
            let document = from_xml_str(&format!("<{new}/>"));
            assert_eq!(document.map(|d| d.root.name).as_deref(), Ok(new.as_str()));
        }
    }
});
