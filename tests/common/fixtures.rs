//! NZB fixtures and test content generators

/// Minimal valid NZB for testing (single segment)
pub const MINIMAL_NZB: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nzb PUBLIC "-//newzBin//DTD NZB 1.1//EN" "http://www.newzbin.com/DTD/nzb/nzb-1.1.dtd">
<nzb xmlns="http://www.newzbin.com/DTD/2003/nzb">
  <head>
    <meta type="title">Test Download</meta>
  </head>
  <file poster="test@example.com" date="1234567890" subject="test.txt (1/1)">
    <groups>
      <group>alt.test</group>
    </groups>
    <segments>
      <segment bytes="100" number="1">test-msgid-12345@example.com</segment>
    </segments>
  </file>
</nzb>"#;

/// Two-segment NZB whose ids need entity decoding and bracket wrapping
pub const TWO_SEGMENT_NZB: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nzb xmlns="http://www.newzbin.com/DTD/2003/nzb">
  <file poster="poster@example.com" date="1234567890" subject="Show.S01E01.mkv (1/2)">
    <groups>
      <group>alt.binaries.test</group>
    </groups>
    <segments>
      <segment bytes="1000" number="1">&lt;item1@test&gt;</segment>
      <segment bytes="1000" number="2">item2@test</segment>
    </segments>
  </file>
</nzb>"#;

/// Single-segment post of a 7z archive part
pub const SEVEN_ZIP_NZB: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nzb xmlns="http://www.newzbin.com/DTD/2003/nzb">
  <file poster="poster@example.com" date="1234567890" subject="&quot;Movie.Part1.7z&quot; yEnc (1/1)">
    <groups>
      <group>alt.binaries.test</group>
    </groups>
    <segments>
      <segment bytes="5000" number="1">archive-part@test</segment>
    </segments>
  </file>
</nzb>"#;

/// Message-id used for segment `index` in [`numbered_nzb`]
pub fn segment_id(index: usize) -> String {
    format!("<seg{index}@test>")
}

/// Single-file NZB with `count` segments named by [`segment_id`]
pub fn numbered_nzb(count: usize) -> String {
    let segments: String = (0..count)
        .map(|i| {
            format!(
                "      <segment bytes=\"750000\" number=\"{}\">seg{i}@test</segment>\n",
                i + 1
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<nzb xmlns="http://www.newzbin.com/DTD/2003/nzb">
  <file poster="poster@example.com" date="1234567890" subject="Large.Post.mkv (1/{count})">
    <groups>
      <group>alt.binaries.test</group>
      <group>alt.binaries.misc</group>
    </groups>
    <segments>
{segments}    </segments>
  </file>
</nzb>"#
    )
}
