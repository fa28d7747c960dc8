#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlretag::{TagMapping, XmlParser, XmlWriter, rename};

fuzz_target!(|data: &[u8]| {
    let Ok(document) = XmlParser::new(data).parse() else {
        return;
    };
    let written = XmlWriter::new().write(&document);
    let reparsed = XmlParser::new(written.as_bytes()).parse();
    assert_eq!(reparsed.as_ref(), Ok(&document));

    let mapping: TagMapping = [(document.root.name.clone(), "renamed".to_string())]
        .into_iter()
        .collect();
    let renamed = rename(document, &mapping);
    assert_eq!(renamed.root.name, "renamed");
});
