use chemgraph::Catalog;
use indoc::indoc;
use once_cell::sync::Lazy;

pub static CATALOG: Lazy<Catalog> = Lazy::new(Catalog::default);

/// Ethanol with a name, a formula, a caption, and a lone pair on its oxygen
pub const ETHANOL: &str = indoc! {r#"
    <?xml version="1.0" encoding="utf-8"?>
    <cml:cml xmlns:cml="http://www.xml-cml.org/schema" xmlns:c4w="http://www.chem4word.com/cml">
      <cml:molecule id="m1">
        <cml:atomArray>
          <cml:atom id="m1.a1" elementType="C" x2="0" y2="0" />
          <cml:atom id="m1.a2" elementType="C" x2="20" y2="0" />
          <cml:atom id="m1.a3" elementType="O" x2="30" y2="17.32">
            <c4w:electron id="m1.a3.e1" count="2" type="LonePair" placement="N" />
          </cml:atom>
        </cml:atomArray>
        <cml:bondArray>
          <cml:bond id="m1.b1" atomRefs2="m1.a1 m1.a2" order="S" />
          <cml:bond id="m1.b2" atomRefs2="m1.a2 m1.a3" order="S">
            <cml:bondStereo>W</cml:bondStereo>
          </cml:bond>
        </cml:bondArray>
        <cml:formula id="m1.f1" convention="chem4word:Formula" inline="C2H6O" />
        <cml:name id="m1.n1" dictRef="chem4word:Synonym">ethanol</cml:name>
        <cml:label id="m1.l1" dictRef="chem4word:Caption" value="solvent" />
      </cml:molecule>
    </cml:cml>
"#};
